//! Daya CLI
//!
//! - `daya serve` - Run the REST API (and the bill scheduler)
//! - `daya bills generate` - Issue this month's bills once
//! - `daya aggregate <file.json>` - Bucket chart data offline
//! - `daya config` - Print a documented default config

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use daya::config::{generate_default_config, Config, LoggingConfig};
use daya::dashboard::{ChartSeries, DashboardController, FilterControls};
use daya::domain::BillingService;
use daya::scheduler::BillScheduler;
use daya::{serve, Aggregator, AppState, Sdk};

#[derive(Parser)]
#[command(name = "daya")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Power usage monitoring and billing for rented rooms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Bill management
    Bills {
        #[command(subcommand)]
        action: BillsAction,
    },

    /// Aggregate a `{ "labels": [...], "data": [...] }` file and print the
    /// filter controls and chart series as JSON
    Aggregate {
        file: PathBuf,
        /// Month select value (`YYYY-M`, empty for all)
        #[arg(short, long)]
        month: Option<String>,
        /// Week select value (`1`..`5` or `all`)
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BillsAction {
    /// Issue bills for the current month
    Generate,
}

#[derive(Deserialize)]
struct ChartData {
    labels: Vec<String>,
    data: Vec<f64>,
}

#[derive(Serialize)]
struct AggregateOutput<'a> {
    controls: &'a FilterControls,
    series: &'a ChartSeries,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => run_server(config, port).await,
        Commands::Bills {
            action: BillsAction::Generate,
        } => {
            let sdk = Sdk::bootstrap(&config.sdk()).context("initialising back end")?;
            let billing = BillingService::new(Arc::clone(sdk.store()), config.domain()?);
            let created = billing.generate_monthly_bills(chrono::Utc::now()).await?;
            println!("{} bill(s) created", created);
            Ok(())
        }
        Commands::Aggregate { file, month, week } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let input: ChartData = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;

            let aggregation =
                Aggregator::new(config.dashboard.aggregator()?).aggregate(&input.labels, &input.data)?;
            let mut controller =
                DashboardController::mount(aggregation, config.dashboard.dashboard(), 1024.0);
            if month.is_some() || week.is_some() {
                controller.apply_query(month.as_deref(), week.as_deref())?;
            }

            let output = AggregateOutput {
                controls: controller.controls(),
                series: controller.chart().series(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
            Ok(())
        }
    }
}

async fn run_server(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }

    tracing::info!("Starting Daya API server v{}", env!("CARGO_PKG_VERSION"));

    let sdk = Sdk::bootstrap(&config.sdk()).context("initialising back end")?;
    let state = AppState::new(sdk, &config)?;

    let scheduler = Arc::new(BillScheduler::new(
        state.billing.clone(),
        config.billing.schedule_interval_hours,
    ));
    let handle = Arc::clone(&scheduler).start();
    if handle.is_none() {
        tracing::info!("Bill scheduler disabled");
    }

    let result = serve(state).await;

    scheduler.stop().await;
    if let Some(handle) = handle {
        handle.abort();
    }
    result.map_err(Into::into)
}

/// `RUST_LOG` wins over the configured level
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("daya={},tower_http=info", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
