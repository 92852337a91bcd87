//! Transient news and job filters. Never persisted.

use std::collections::BTreeSet;
use std::convert::Infallible;

use super::{Reducer, Store};
use crate::metro::{JobPosting, JobType, NewsArticle};

pub type FiltersStore = Store<FiltersState>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiltersState {
  /// Article categories to show, e.g. "incident"
  pub news_status: BTreeSet<String>,
  /// Metro systems to show articles about
  pub news_region: BTreeSet<String>,
  pub news_search_term: String,
  pub jobs_type: BTreeSet<JobType>,
  pub jobs_location: BTreeSet<String>,
  pub jobs_search_term: String,
}

impl Default for FiltersState {
  fn default() -> Self {
    Self {
      news_status: BTreeSet::new(),
      news_region: BTreeSet::new(),
      news_search_term: String::new(),
      jobs_type: BTreeSet::from([JobType::FullTime]),
      jobs_location: BTreeSet::new(),
      jobs_search_term: String::new(),
    }
  }
}

/// News fields to overwrite; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct NewsFilters {
  pub status: Option<BTreeSet<String>>,
  pub region: Option<BTreeSet<String>>,
  pub search_term: Option<String>,
}

/// Job fields to overwrite; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct JobsFilters {
  pub job_type: Option<BTreeSet<JobType>>,
  pub location: Option<BTreeSet<String>>,
  pub search_term: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FiltersAction {
  SetNews(NewsFilters),
  SetJobs(JobsFilters),
  ClearAll,
}

impl Reducer for FiltersState {
  type Action = FiltersAction;
  type Error = Infallible;

  fn reduce(&mut self, action: FiltersAction) -> Result<(), Infallible> {
    match action {
      FiltersAction::SetNews(news) => {
        if let Some(status) = news.status {
          self.news_status = status;
        }
        if let Some(region) = news.region {
          self.news_region = region;
        }
        if let Some(term) = news.search_term {
          self.news_search_term = term;
        }
      }
      FiltersAction::SetJobs(jobs) => {
        if let Some(job_type) = jobs.job_type {
          self.jobs_type = job_type;
        }
        if let Some(location) = jobs.location {
          self.jobs_location = location;
        }
        if let Some(term) = jobs.search_term {
          self.jobs_search_term = term;
        }
      }
      FiltersAction::ClearAll => *self = Self::default(),
    }
    Ok(())
  }
}

impl FiltersState {
  /// Whether `article` passes the news filters. Empty sets match everything.
  pub fn matches_article(&self, article: &NewsArticle) -> bool {
    let status_ok = self.news_status.is_empty()
      || self
        .news_status
        .iter()
        .any(|s| s.eq_ignore_ascii_case(article.category.as_str()));

    let region_ok = self.news_region.is_empty()
      || article
        .metro
        .as_deref()
        .is_some_and(|metro| self.news_region.iter().any(|r| contains_ci(metro, r)));

    status_ok
      && region_ok
      && matches_term(
        &self.news_search_term,
        [&article.title, &article.description, &article.source],
      )
  }

  /// Whether `job` passes the job filters. Empty sets match everything.
  pub fn matches_job(&self, job: &JobPosting) -> bool {
    let type_ok = self.jobs_type.is_empty() || self.jobs_type.contains(&job.job_type);
    let location_ok = self.jobs_location.is_empty()
      || self
        .jobs_location
        .iter()
        .any(|l| contains_ci(&job.location, l));

    type_ok
      && location_ok
      && matches_term(
        &self.jobs_search_term,
        [&job.title, &job.company, &job.description],
      )
  }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_term<'a>(term: &str, fields: impl IntoIterator<Item = &'a String>) -> bool {
  let term = term.trim();
  term.is_empty() || fields.into_iter().any(|field| contains_ci(field, term))
}

impl Store<FiltersState> {
  pub fn set_news_filters(&self, filters: NewsFilters) {
    self.apply(FiltersAction::SetNews(filters));
  }

  pub fn set_jobs_filters(&self, filters: JobsFilters) {
    self.apply(FiltersAction::SetJobs(filters));
  }

  pub fn clear_all_filters(&self) {
    self.apply(FiltersAction::ClearAll);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metro::NewsCategory;

  fn job(title: &str, location: &str, job_type: JobType) -> JobPosting {
    JobPosting {
      id: title.to_lowercase(),
      title: title.to_string(),
      company: "DMRC".to_string(),
      location: location.to_string(),
      description: "Signalling upgrades".to_string(),
      job_type,
      posted_at: "2024-05-01".to_string(),
      applicants: None,
    }
  }

  fn article(title: &str, metro: Option<&str>, category: NewsCategory) -> NewsArticle {
    NewsArticle {
      id: "1".to_string(),
      title: title.to_string(),
      description: String::new(),
      url: "https://example.com/a".to_string(),
      image_url: None,
      source: "Metro Rail News".to_string(),
      published_at: "2024-05-01".to_string(),
      metro: metro.map(String::from),
      category,
    }
  }

  #[test]
  fn test_defaults() {
    let state = FiltersState::default();
    assert!(state.news_status.is_empty());
    assert!(state.news_search_term.is_empty());
    assert_eq!(state.jobs_type, BTreeSet::from([JobType::FullTime]));
  }

  #[test]
  fn test_set_filters_merges_shallowly() {
    let store = FiltersStore::new(FiltersState::default());
    store.set_news_filters(NewsFilters {
      search_term: Some("tunnel".into()),
      ..Default::default()
    });
    store.set_jobs_filters(JobsFilters {
      location: Some(BTreeSet::from(["Delhi".to_string()])),
      ..Default::default()
    });

    let state = store.get_state();
    assert_eq!(state.news_search_term, "tunnel");
    assert_eq!(state.jobs_location.len(), 1);
    assert_eq!(state.jobs_type, BTreeSet::from([JobType::FullTime]));
    assert!(state.news_region.is_empty());
  }

  #[test]
  fn test_clear_all_filters_restores_defaults() {
    let store = FiltersStore::new(FiltersState::default());
    store.set_news_filters(NewsFilters {
      status: Some(BTreeSet::from(["incident".to_string()])),
      region: Some(BTreeSet::from(["Delhi".to_string()])),
      search_term: Some("delay".into()),
    });
    store.set_jobs_filters(JobsFilters {
      job_type: Some(BTreeSet::from([JobType::Contract, JobType::Internship])),
      location: None,
      search_term: Some("engineer".into()),
    });

    store.clear_all_filters();
    assert_eq!(store.get_state(), FiltersState::default());
  }

  #[test]
  fn test_matches_job() {
    let mut state = FiltersState::default();
    let delhi = job("Signal Engineer", "New Delhi, India", JobType::FullTime);
    let intern = job("Planning Intern", "Riyadh", JobType::Internship);

    assert!(state.matches_job(&delhi));
    assert!(!state.matches_job(&intern));

    state.jobs_type.clear();
    state.jobs_location.insert("delhi".into());
    assert!(state.matches_job(&delhi));
    assert!(!state.matches_job(&intern));

    state.jobs_search_term = "SIGNAL".into();
    assert!(state.matches_job(&delhi));
    state.jobs_search_term = "driver".into();
    assert!(!state.matches_job(&delhi));
  }

  #[test]
  fn test_matches_article() {
    let mut state = FiltersState::default();
    let outage = article("Blue line outage", Some("Delhi Metro"), NewsCategory::Incident);
    let opening = article("Line 3 opens", None, NewsCategory::Expansion);

    assert!(state.matches_article(&outage));
    assert!(state.matches_article(&opening));

    state.news_status.insert("Incident".into());
    assert!(state.matches_article(&outage));
    assert!(!state.matches_article(&opening));

    state.news_region.insert("delhi".into());
    state.news_search_term = "outage".into();
    assert!(state.matches_article(&outage));

    state.news_region = BTreeSet::from(["Riyadh".to_string()]);
    assert!(!state.matches_article(&outage));
  }
}
