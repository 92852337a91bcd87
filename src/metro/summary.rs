use super::types::{MetroProject, ProjectStatus};

/// Headline totals for the stats panel, derived from a project list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSummary {
  pub projects: usize,
  pub operational: usize,
  pub network_km: f64,
  pub stations: u64,
  pub daily_riders: u64,
}

impl NetworkSummary {
  /// Projects with unparseable lengths or ridership still count toward the
  /// project and station totals.
  pub fn from_projects(projects: &[MetroProject]) -> Self {
    projects.iter().fold(Self::default(), |mut acc, project| {
      acc.projects += 1;
      if project.status == ProjectStatus::Operational {
        acc.operational += 1;
      }
      acc.network_km += project.length_km().unwrap_or(0.0);
      acc.stations = acc.stations.saturating_add(u64::from(project.stations));
      acc.daily_riders = acc
        .daily_riders
        .saturating_add(project.riders_daily_count().unwrap_or(0));
      acc
    })
  }

  /// Ridership formatted the way the API reports it, e.g. "13.5M".
  pub fn daily_riders_display(&self) -> String {
    let riders = self.daily_riders as f64;
    if riders >= 1_000_000.0 {
      format!("{:.1}M", riders / 1_000_000.0)
    } else if riders >= 1_000.0 {
      format!("{:.0}K", riders / 1_000.0)
    } else {
      self.daily_riders.to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metro::default_projects;

  #[test]
  fn test_summary_of_default_projects() {
    let summary = NetworkSummary::from_projects(&default_projects());
    assert_eq!(summary.projects, 3);
    assert_eq!(summary.operational, 3);
    assert_eq!(summary.network_km, 1400.0);
    assert_eq!(summary.stations, 882);
    assert_eq!(summary.daily_riders, 13_500_000);
    assert_eq!(summary.daily_riders_display(), "13.5M");
  }

  #[test]
  fn test_unparseable_fields_still_count() {
    let mut project = default_projects().remove(0);
    project.length = "unknown".into();
    project.riders_daily = None;
    project.status = ProjectStatus::Planned;

    let summary = NetworkSummary::from_projects(&[project]);
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.operational, 0);
    assert_eq!(summary.network_km, 0.0);
    assert_eq!(summary.stations, 289);
    assert_eq!(summary.daily_riders_display(), "0");
  }

  #[test]
  fn test_absurd_ridership_is_ignored() {
    let mut projects = default_projects();
    projects[0].riders_daily = Some("1e20".into());
    projects[1].riders_daily = Some("inf".into());
    projects[2].riders_daily = Some("18446744073709551615".into());

    let summary = NetworkSummary::from_projects(&projects);
    assert_eq!(summary.projects, 3);
    assert_eq!(summary.daily_riders, 0);
  }

  #[test]
  fn test_totals_saturate_instead_of_overflowing() {
    let mut projects = default_projects();
    projects[0].riders_daily = Some("18000000000000000000".into());
    projects[1].riders_daily = Some("18000000000000000000".into());

    let summary = NetworkSummary::from_projects(&projects);
    assert_eq!(summary.daily_riders, u64::MAX);
  }
}
