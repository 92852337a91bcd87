//! Detailed per-system records: engineering specs, finances, operations,
//! expansion and sustainability.
//!
//! Money is in USD millions unless a field says otherwise; percentages are
//! plain numbers (`87.5` means 87.5 %).

use serde::{Deserialize, Serialize};

use super::types::ProjectStatus;

/// Lifecycle status, including systems no longer in service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemStatus {
  Operational,
  UnderConstruction,
  Planned,
  Suspended,
  Closed,
}

impl SystemStatus {
  /// The dashboard card status, if the system still has one.
  pub fn as_project_status(&self) -> Option<ProjectStatus> {
    match self {
      SystemStatus::Operational => Some(ProjectStatus::Operational),
      SystemStatus::UnderConstruction => Some(ProjectStatus::UnderConstruction),
      SystemStatus::Planned => Some(ProjectStatus::Planned),
      SystemStatus::Suspended | SystemStatus::Closed => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroSystemSpecs {
  /// e.g. "Driverless", "Semi-Automated"
  pub train_type: String,
  pub track_gauge: String,
  pub voltage_system: String,
  pub signalling_system: String,
  /// km/h
  pub max_speed: f64,
  pub average_speed: f64,
  /// Trains per hour at peak
  pub frequency: f64,
  pub car_count: u32,
  /// Passengers per train
  pub capacity: u32,
  pub peak_hour_capacity: u64,
  pub total_train_fleet: u32,
  pub platform_screen_doors: bool,
  pub automatic_ticketing: bool,
  pub mobile_ticketing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingSources {
  pub government: f64,
  pub public_bonds: f64,
  pub international_loans: f64,
  pub private_investment: f64,
  pub other: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroFinancials {
  pub total_project_cost: f64,
  /// USD per km
  pub cost_per_km: f64,
  pub funding_sources: FundingSources,
  pub yearly_operating_budget: f64,
  pub maintenance_budget: f64,
  /// Fare revenue over operating cost, in percent
  pub cost_recovery_ratio: f64,
  pub average_fare_revenue: f64,
  pub subsidy_required: f64,
  pub employee_count: u32,
  /// Negative when running at a loss
  pub profit_margin: f64,
  pub debt_outstanding: f64,
  pub interest_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroOperationalMetrics {
  pub daily_ridership: u64,
  pub annual_ridership: u64,
  pub peak_hour_ridership: u64,
  pub average_occupancy: f64,
  pub peak_occupancy: f64,
  pub punctuality: f64,
  /// Minutes
  pub average_wait_time: f64,
  /// e.g. "05:00-23:00"
  pub operating_hours: String,
  pub stations_open_24_hours: u32,
  pub wheelchair_accessible_stations: u32,
  /// Percent of stations
  pub total_accessible_stations: f64,
  /// Runs on weekends and holidays
  pub weekday_holiday: bool,
  pub avg_passengers_per_station: f64,
  /// USD
  pub avg_ticket_price: f64,
  pub revenue_per_km: f64,
  pub cost_per_passenger: f64,
  pub employee_productivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroExpansionPlan {
  pub phase_number: u32,
  pub phase_name: String,
  pub planned_opening_date: String,
  pub actual_opening_date: String,
  pub new_lines_km: f64,
  pub new_stations: u32,
  pub planned_completion_date: String,
  pub completion_percentage: f64,
  pub estimated_budget: f64,
  pub actual_spent_to_date: f64,
  /// Negative when under budget
  pub budget_overrun: f64,
  pub expected_delay_months: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroSustainability {
  pub energy_source: Vec<String>,
  pub renewable_energy_percent: f64,
  /// kg CO2 per passenger per year
  pub carbon_emission_per_passenger: f64,
  /// Percent versus private cars
  pub emissions_reduction: f64,
  pub community_affected: u64,
  pub displaced_communities: u64,
  pub relocation_compensation: f64,
  pub local_employment_created: u64,
  pub women_employment_percent: f64,
  /// 1 to 10
  pub accessibility_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroLine {
  pub line_number: String,
  pub line_name: String,
  pub color: String,
  pub length_km: f64,
  pub station_count: u32,
  pub operational_date: String,
}

/// Full profile of one metro system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroProjectEnhanced {
  pub id: String,
  pub name: String,
  pub city: String,
  pub country: String,
  /// ISO 3166-1 alpha-2
  pub country_code: String,
  pub region: String,

  pub operational_date: String,
  pub construction_start_date: String,
  /// Years from start to completion
  pub project_duration: f64,
  pub current_expansion_phase: MetroExpansionPlan,

  pub total_length: f64,
  pub total_stations: u32,
  pub lines: Vec<MetroLine>,

  pub status: SystemStatus,
  /// e.g. "Fully Operational", "80% Complete"
  pub operational_status: String,

  pub systems: MetroSystemSpecs,
  pub financials: MetroFinancials,
  pub operations: MetroOperationalMetrics,
  pub sustainability: MetroSustainability,

  pub governing_authority: String,
  pub main_operator: String,
  pub chief_engineer: String,
  pub contact_website: String,
  pub official_website: String,

  pub safety_rating: f64,
  pub reliability_rating: f64,
  pub cleanliness_rating: f64,
  pub passenger_satisfaction: f64,

  pub latitude: f64,
  pub longitude: f64,
  /// Square km
  pub service_area: f64,
  pub depot_count: u32,
  pub depot_capacity: u32,
  pub interchange_stations: u32,

  pub last_updated: String,
  pub next_planned_expansion: String,
}

impl MetroProjectEnhanced {
  /// Sum of the per-line lengths. Can differ from `total_length` when the
  /// API only lists some lines.
  pub fn line_length_km(&self) -> f64 {
    self.lines.iter().map(|line| line.length_km).sum()
  }

  pub fn is_in_service(&self) -> bool {
    self.status == SystemStatus::Operational
  }
}
