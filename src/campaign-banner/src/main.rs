//! Campaign Banner — decides which promotional banner to show.
//!
//! Builds one decision engine over the built-in schedule and the configured
//! dismissal store, applies a single action, and prints the result as JSON.

use anyhow::Context;
use campaign_banner::{
    CampaignCatalog, CampaignDecisionEngine, DateProvider, Decision, DismissalSettings,
    DismissalState, FixedClock, JsonFileStore, KeyValueStore,
};
use campaign_banner::clock::system_clock;
use campaign_core::config::AppConfig;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-banner-cli")]
#[command(about = "Decide which promotional campaign banner to show")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, env = "CAMPAIGN_BANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Dismissal state file (overrides config)
    #[arg(long, env = "CAMPAIGN_BANNER__STORAGE__PATH")]
    state_file: Option<PathBuf>,

    /// Storage group (overrides config)
    #[arg(long, env = "CAMPAIGN_BANNER__STORAGE__GROUP")]
    group: Option<String>,

    /// Evaluate at this RFC 3339 instant instead of the current time
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute and print the banner to show
    Show {
        /// Clear any standing dismissal first
        #[arg(long, default_value_t = false)]
        force_reset: bool,
    },
    /// Dismiss the current banner
    Dismiss,
    /// Print the persisted dismissal state and current decision
    Status,
    /// Print the campaign schedule
    Catalog,
}

#[derive(Serialize)]
struct Report {
    campaign: Decision,
    dismissal: DismissalState,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Apply CLI overrides
    if let Some(path) = &cli.state_file {
        config.storage.path = path.display().to_string();
    }
    if let Some(group) = cli.group {
        config.storage.group = group;
    }

    init_tracing(&config);
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!(
        group = %config.storage.group,
        path = %config.storage.path,
        "Configuration loaded"
    );

    let catalog = CampaignCatalog::builtin();
    catalog.validate().context("built-in campaign catalog is invalid")?;

    if let Command::Catalog = cli.command {
        println!("{}", serde_json::to_string_pretty(catalog.definitions())?);
        return Ok(());
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.storage.path).with_context(|| {
            format!("failed to open dismissal state at {}", config.storage.path)
        })?,
    );
    let clock: Arc<dyn DateProvider> = match cli.at {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => system_clock(),
    };

    let engine = CampaignDecisionEngine::new(
        catalog,
        clock,
        DismissalSettings::new(store, config.storage.group.clone()),
    );

    match cli.command {
        Command::Show { force_reset } => engine.refresh(force_reset),
        Command::Dismiss => engine.dismiss(),
        Command::Status | Command::Catalog => {}
    }

    let report = Report {
        campaign: engine.active_campaign(),
        dismissal: engine.dismissal_state(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
