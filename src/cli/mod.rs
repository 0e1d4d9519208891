use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use time::{Date, OffsetDateTime};
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::catalog;
use crate::config::ConfigLoader;
use crate::license::parse_date;

pub mod commands;

use self::commands::{AlertArgs, ListArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "lictui",
    version,
    about = "Terminal dashboard for software license expiry"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over LICTUI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Load licenses from a TOML or JSON file (takes precedence over LICTUI_LICENSES)
    #[arg(long)]
    pub licenses: Option<PathBuf>,

    /// Evaluate expiry against this date (YYYY-MM-DD) instead of the local date
    #[arg(long)]
    pub today: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive dashboard (default on a terminal)
    Tui,
    /// Print the filtered and sorted license table
    List(ListArgs),
    /// Show every field of a single license
    Show(ShowArgs),
    /// Print license counts per expiry status
    Summary,
    /// Print a markdown report of licenses expiring soon
    Alert(AlertArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("LICTUI_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let mut config = loader.load_or_init()?;

    let licenses_override = cli
        .licenses
        .clone()
        .or_else(|| env::var_os("LICTUI_LICENSES").map(PathBuf::from));
    if let Some(path) = licenses_override {
        config.source.path = Some(path);
    }

    let today_override = resolve_today(cli.today.as_deref())?;
    let today = today_override.unwrap_or_else(local_today);
    let catalog = catalog::load(&config.source).context("loading license catalog")?;

    let config = Arc::new(config);
    let command = cli.command.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            Commands::Tui
        } else {
            Commands::List(ListArgs::default())
        }
    });
    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), catalog, today_override);
            commands::run_tui(&mut app)
        }
        Commands::List(args) => commands::list_licenses(&config, &catalog, today, args),
        Commands::Show(args) => commands::show_license(&config, &catalog, today, args),
        Commands::Summary => commands::print_summary(&catalog, today),
        Commands::Alert(args) => commands::alert_report(&config, &catalog, today, args),
    }
}

/// The current calendar date in the local timezone, falling back to UTC
/// when the local offset cannot be determined.
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn resolve_today(raw: Option<&str>) -> Result<Option<Date>> {
    raw.map(|value| {
        parse_date(value).with_context(|| format!("--today expects YYYY-MM-DD, got '{value}'"))
    })
    .transpose()
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
