use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metrodash::metro::{MetroProject, NetworkSummary, Projects};
use metrodash::query::QueryResult;
use metrodash::store::{DashboardWidget, WidgetPatch};
use metrodash::{Config, Dashboard};

#[derive(Parser, Debug)]
#[command(name = "metrodash")]
#[command(about = "Metro rail projects dashboard with cached live data")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/metrodash/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List metro projects for the selected city
  Projects {
    /// List every project instead of one city's
    #[arg(long)]
    all: bool,

    /// City to query (default: the saved city)
    #[arg(long)]
    city: Option<String>,
  },

  /// Follow live updates for the selected city
  Watch {
    /// Stop after this many updates
    #[arg(long)]
    updates: Option<usize>,
  },

  /// Inspect or change the dashboard layout
  Widgets {
    #[command(subcommand)]
    action: WidgetsCommand,
  },

  /// Inspect or change UI preferences
  Prefs {
    #[command(subcommand)]
    action: PrefsCommand,
  },
}

#[derive(Subcommand, Debug)]
enum WidgetsCommand {
  List,
  Toggle { id: String },
  /// Move a widget to a 1-based position
  Move { id: String, position: u32 },
  Reset,
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
  Show,
  City { city: String },
  Compact {
    #[arg(action = clap::ArgAction::Set)]
    enabled: bool,
  },
  DarkMode,
  Sidebar,
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  // RUST_LOG controls the level (e.g. RUST_LOG=metrodash=debug)
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  match log_file {
    Some(path) => {
      let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
      Ok(None)
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing(args.log_file.as_deref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  info!(base_url = %config.api.base_url, "metrodash starting");

  let dashboard = Dashboard::open(config)?;

  match args.command {
    Command::Projects { all, city } => show_projects(&dashboard, all, city).await,
    Command::Watch { updates } => watch(&dashboard, updates).await,
    Command::Widgets { action } => widgets(&dashboard, action),
    Command::Prefs { action } => prefs(&dashboard, action),
  }
}

async fn show_projects(dashboard: &Dashboard, all: bool, city: Option<String>) -> Result<()> {
  let result = match (all, city) {
    (true, _) => dashboard.metro().fetch_all_projects().await,
    (false, Some(city)) => dashboard.metro().fetch_metro_stats(Some(&city)).await,
    (false, None) => dashboard.city_projects().await,
  };

  print_result(&result);
  let summary = NetworkSummary::from_projects(&result.data);
  println!(
    "{} projects, {} operational, {:.0} km, {} stations, {} riders/day",
    summary.projects,
    summary.operational,
    summary.network_km,
    summary.stations,
    summary.daily_riders_display()
  );
  Ok(())
}

async fn watch(dashboard: &Dashboard, updates: Option<usize>) -> Result<()> {
  let mut subscription = dashboard.watch_city_projects();
  print_result(&subscription.current());

  let mut seen = 0;
  while updates.map_or(true, |limit| seen < limit) {
    tokio::select! {
      changed = subscription.changed() => match changed {
        Some(result) => {
          seen += 1;
          print_result(&result);
        }
        None => break,
      },
      _ = tokio::signal::ctrl_c() => break,
    }
  }
  Ok(())
}

fn widgets(dashboard: &Dashboard, action: WidgetsCommand) -> Result<()> {
  let layout = dashboard.layout();
  match action {
    WidgetsCommand::List => {}
    WidgetsCommand::Toggle { id } => layout.toggle_widget(&id)?,
    WidgetsCommand::Move { id, position } => layout.update_widget(
      &id,
      WidgetPatch {
        position: Some(position),
        ..Default::default()
      },
    )?,
    WidgetsCommand::Reset => layout.reset_to_default(),
  }

  let mut widgets = layout.get_state().widgets;
  widgets.sort_by_key(|w| w.position);
  for widget in &widgets {
    print_widget(widget);
  }
  Ok(())
}

fn prefs(dashboard: &Dashboard, action: PrefsCommand) -> Result<()> {
  let ui = dashboard.ui();
  match action {
    PrefsCommand::Show => {}
    PrefsCommand::City { city } => {
      let city = city.trim();
      if city.is_empty() {
        return Err(eyre!("City must not be empty"));
      }
      ui.set_selected_city(city);
    }
    PrefsCommand::Compact { enabled } => ui.set_compact_mode(enabled),
    PrefsCommand::DarkMode => ui.toggle_dark_mode(),
    PrefsCommand::Sidebar => ui.toggle_sidebar(),
  }

  let state = ui.get_state();
  println!("city:      {}", state.selected_city);
  println!("compact:   {}", state.compact_mode);
  println!("dark mode: {}", state.is_dark_mode);
  println!("sidebar:   {}", state.sidebar_open);
  Ok(())
}

fn print_result(result: &QueryResult<Projects>) {
  let updated = result
    .updated_at
    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| "never".to_string());
  println!(
    "[{:?} / {:?}] updated {}{}",
    result.status,
    result.source,
    updated,
    if result.is_fetching { " (refreshing)" } else { "" }
  );
  if let Some(error) = &result.error {
    println!("  last error: {}", error);
  }
  for project in result.data.iter() {
    print_project(project);
  }
}

fn print_project(project: &MetroProject) {
  println!(
    "  {:<24} {:<16} {:>9} {:>5} stations  {:<18} {}",
    project.name,
    project.country,
    project.length,
    project.stations,
    project.status.label(),
    project.riders_daily.as_deref().unwrap_or("-")
  );
}

fn print_widget(widget: &DashboardWidget) {
  println!(
    "{:>2}. {:<12} {:<24} {}",
    widget.position,
    widget.id,
    widget.title,
    if widget.visible { "visible" } else { "hidden" }
  );
}
