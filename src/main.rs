//! CLI entry point for the vaccination-status report.
//!
//! Downloads the Québec case and hospitalization datasets, normalizes them
//! against the vaccination rate and writes the two-panel HTML report.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vaxreport::config::DegenerateRatePolicy;
use vaxreport::fetch::BasicClient;
use vaxreport::pipeline::{self, RunOptions};
use vaxreport::ReportConfig;

#[derive(Parser)]
#[command(name = "vaxreport")]
#[command(about = "Cases and hospitalizations per 100,000 by vaccination status", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Overrides {
    /// JSON config file; flags below override its values
    #[arg(short, long, global = true, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Where to write the HTML report
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Manually downloaded vaccination-rate CSV
    #[arg(long, global = true, value_name = "CSV")]
    vaccination: Option<PathBuf>,

    /// Total population used for normalization
    #[arg(long, global = true)]
    population: Option<u64>,

    /// Rolling-average window plotted in the report, in days
    #[arg(long, global = true)]
    display_window: Option<usize>,

    /// Skip rows whose vaccination rate leaves an empty subgroup instead of failing
    #[arg(long, global = true, default_value_t = false)]
    drop_degenerate_rates: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the datasets, process them and write the report
    Run {
        /// Reuse previously downloaded CSVs instead of fetching
        #[arg(long, default_value_t = false)]
        skip_fetch: bool,

        /// Also write the processed series to this CSV
        #[arg(short, long, value_name = "CSV")]
        export: Option<PathBuf>,
    },
    /// Only download the case and hospitalization datasets
    Fetch,
}

impl Overrides {
    fn resolve(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ReportConfig::default(),
        };

        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(vaccination) = &self.vaccination {
            config.vaccination.file = vaccination.clone();
        }
        if let Some(population) = self.population {
            config.population = population;
        }
        if let Some(window) = self.display_window {
            config.display_window = window;
        }
        if self.drop_degenerate_rates {
            config.degenerate_rate = DegenerateRatePolicy::Drop;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vaxreport.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vaxreport.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = cli.overrides.resolve()?;
    debug!(config = %serde_json::to_string(&config)?, "Configuration resolved");
    let client = BasicClient::new();

    match cli.command {
        Commands::Run { skip_fetch, export } => {
            let options = RunOptions { skip_fetch, export };
            let today = Local::now().date_naive();
            pipeline::run(&client, &config, &options, today)
                .await
                .context("report run failed")?;
            info!(output = %config.output_path.display(), "Done");
        }
        Commands::Fetch => {
            pipeline::acquire(&client, &config)
                .await
                .context("download failed")?;
        }
    }

    Ok(())
}
