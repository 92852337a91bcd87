//! Metro dashboard records as served by the API.
//!
//! Records are immutable once fetched: a refresh replaces a whole list,
//! nothing is patched field by field.

use serde::{Deserialize, Serialize};

/// Line color used to tint a project card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineColor {
  Blue,
  Yellow,
  Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
  Operational,
  UnderConstruction,
  Planned,
}

impl ProjectStatus {
  pub fn label(&self) -> &'static str {
    match self {
      ProjectStatus::Operational => "Operational",
      ProjectStatus::UnderConstruction => "Under construction",
      ProjectStatus::Planned => "Planned",
    }
  }
}

/// A metro rail project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroProject {
  pub id: String,
  pub name: String,
  pub location: String,
  pub country: String,
  /// Display length, e.g. "394 km"
  pub length: String,
  pub stations: u32,
  pub color: LineColor,
  pub status: ProjectStatus,
  pub operational_date: String,
  /// Display ridership, e.g. "2.7M"
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub riders_daily: Option<String>,
}

impl MetroProject {
  /// Network length in kilometres, parsed from the display string.
  pub fn length_km(&self) -> Option<f64> {
    let number = self.length.trim().trim_end_matches("km").trim();
    let km: f64 = number.replace(',', "").parse().ok()?;
    (km.is_finite() && km >= 0.0).then_some(km)
  }

  /// Daily riders, parsed from forms like "2.7M", "500K" or "120000".
  pub fn riders_daily_count(&self) -> Option<u64> {
    parse_scaled_count(self.riders_daily.as_deref()?)
  }
}

fn parse_scaled_count(value: &str) -> Option<u64> {
  let value = value.trim().replace(',', "");
  let (number, scale) = match value.chars().last()? {
    'K' | 'k' => (&value[..value.len() - 1], 1_000.0),
    'M' | 'm' => (&value[..value.len() - 1], 1_000_000.0),
    'B' | 'b' => (&value[..value.len() - 1], 1_000_000_000.0),
    _ => (value.as_str(), 1.0),
  };
  let count = number.trim().parse::<f64>().ok()? * scale;
  if !count.is_finite() || count < 0.0 || count >= u64::MAX as f64 {
    return None;
  }
  Some(count.round() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
  News,
  Incident,
  Expansion,
  Technology,
}

impl NewsCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      NewsCategory::News => "news",
      NewsCategory::Incident => "incident",
      NewsCategory::Expansion => "expansion",
      NewsCategory::Technology => "technology",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
  pub id: String,
  pub title: String,
  pub description: String,
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  pub source: String,
  pub published_at: String,
  /// Metro system the article is about
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metro: Option<String>,
  pub category: NewsCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
  FullTime,
  Contract,
  Internship,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
  pub id: String,
  pub title: String,
  pub company: String,
  pub location: String,
  pub description: String,
  pub job_type: JobType,
  pub posted_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub applicants: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroSystem {
  pub id: String,
  pub name: String,
  pub city: String,
  pub country: String,
  pub description: String,
  pub operational_status: String,
  pub capacity: String,
  pub technology: String,
}

/// Operating statistics for one metro system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroStats {
  pub metro_id: String,
  pub daily_riders: u64,
  pub network_length: String,
  pub total_stations: u32,
  pub avg_wait_time: String,
  pub on_time_percentage: f64,
}

/// Envelope some endpoints wrap their payload in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub success: bool,
  pub data: T,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
  pub items: Vec<T>,
  pub total: u64,
  pub page: u32,
  pub page_size: u32,
}
