use super::types::{LineColor, MetroProject, ProjectStatus};

/// Projects shown when live data cannot be fetched.
pub fn default_projects() -> Vec<MetroProject> {
  vec![
    project("1", "Delhi Metro", "India", "394 km", 289, LineColor::Blue, "2002", "2.7M"),
    project(
      "2",
      "Riyadh Metro",
      "Saudi Arabia",
      "176 km",
      85,
      LineColor::Yellow,
      "2024",
      "500K",
    ),
    project("3", "Shanghai Metro", "China", "830 km", 508, LineColor::Red, "1993", "10.3M"),
  ]
}

#[allow(clippy::too_many_arguments)]
fn project(
  id: &str,
  name: &str,
  country: &str,
  length: &str,
  stations: u32,
  color: LineColor,
  operational_date: &str,
  riders_daily: &str,
) -> MetroProject {
  MetroProject {
    id: id.to_string(),
    name: name.to_string(),
    location: country.to_string(),
    country: country.to_string(),
    length: length.to_string(),
    stations,
    color,
    status: ProjectStatus::Operational,
    operational_date: operational_date.to_string(),
    riders_daily: Some(riders_daily.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_projects() {
    let projects = default_projects();
    let summary: Vec<(&str, &str, u32)> = projects
      .iter()
      .map(|p| (p.name.as_str(), p.length.as_str(), p.stations))
      .collect();
    assert_eq!(
      summary,
      vec![
        ("Delhi Metro", "394 km", 289),
        ("Riyadh Metro", "176 km", 85),
        ("Shanghai Metro", "830 km", 508),
      ]
    );
    assert!(projects.iter().all(|p| p.status == ProjectStatus::Operational));
  }
}
