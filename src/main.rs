// jobscrape: collect job listings from a registry of career pages
//
// Loads the registry and rules, runs the two-tier extraction, and writes the
// merged listings to a spreadsheet. Exit code 1 means the spreadsheet could
// not be written; site-level failures are reported but do not fail the run.

use anyhow::{Context, Result};
use clap::Parser;
use jobscrape::config::HarvestConfig;
use jobscrape::utils::{
    DEFAULT_HEAVY_CONCURRENCY, DEFAULT_HEAVY_TIMEOUT_SECS, DEFAULT_LIGHT_CONCURRENCY,
    DEFAULT_LIGHT_TIMEOUT_SECS, DEFAULT_MAX_PER_DOMAIN, DEFAULT_OUTPUT_PATH,
    DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_REGISTRY_PATH, DEFAULT_SELECTOR_WAIT_SECS,
};
use jobscrape::{
    ChromiumRuntime, Dispatcher, ExportReport, RulesBook, export_jobs, load_registry,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jobscrape")]
#[command(about = "Aggregate job listings from career pages into one spreadsheet")]
struct Cli {
    /// Registry CSV with firm_name, url and platform_type columns
    #[arg(long, env = "JOBSCRAPE_REGISTRY", default_value = DEFAULT_REGISTRY_PATH)]
    registry: PathBuf,

    /// JSON rules book for browser-rendered sites
    #[arg(long, env = "JOBSCRAPE_RULES")]
    rules: Option<PathBuf>,

    /// Output spreadsheet (.xlsx, or .csv)
    #[arg(short, long, env = "JOBSCRAPE_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    #[arg(long, env = "JOBSCRAPE_LIGHT_CONCURRENCY", default_value_t = DEFAULT_LIGHT_CONCURRENCY)]
    light_concurrency: usize,

    #[arg(long, env = "JOBSCRAPE_HEAVY_CONCURRENCY", default_value_t = DEFAULT_HEAVY_CONCURRENCY)]
    heavy_concurrency: usize,

    /// Simultaneous attempts against one host
    #[arg(long, env = "JOBSCRAPE_MAX_PER_DOMAIN", default_value_t = DEFAULT_MAX_PER_DOMAIN)]
    max_per_domain: usize,

    /// Seconds allowed for one static fetch-and-parse
    #[arg(long, env = "JOBSCRAPE_LIGHT_TIMEOUT", default_value_t = DEFAULT_LIGHT_TIMEOUT_SECS)]
    light_timeout: u64,

    /// Seconds allowed for one browser extraction
    #[arg(long, env = "JOBSCRAPE_HEAVY_TIMEOUT", default_value_t = DEFAULT_HEAVY_TIMEOUT_SECS)]
    heavy_timeout: u64,

    #[arg(long, env = "JOBSCRAPE_PAGE_LOAD_TIMEOUT", default_value_t = DEFAULT_PAGE_LOAD_TIMEOUT_SECS)]
    page_load_timeout: u64,

    #[arg(long, env = "JOBSCRAPE_SELECTOR_WAIT", default_value_t = DEFAULT_SELECTOR_WAIT_SECS)]
    selector_wait: u64,

    /// Show the browser window
    #[arg(long, env = "JOBSCRAPE_HEADED")]
    headed: bool,

    /// Parent directory for the per-run Chrome profile (default: the system temp dir)
    #[arg(long, env = "JOBSCRAPE_CHROME_DATA_DIR")]
    chrome_data_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<HarvestConfig> {
        let mut builder = HarvestConfig::builder()
            .registry_path(self.registry)
            .output_path(self.output)
            .light_concurrency(self.light_concurrency)
            .heavy_concurrency(self.heavy_concurrency)
            .max_per_domain(self.max_per_domain)
            .light_timeout_secs(self.light_timeout)
            .heavy_timeout_secs(self.heavy_timeout)
            .page_load_timeout_secs(self.page_load_timeout)
            .selector_wait_secs(self.selector_wait)
            .headless(!self.headed);

        if let Some(rules) = self.rules {
            builder = builder.rules_path(rules);
        }
        if let Some(dir) = self.chrome_data_dir {
            builder = builder.chrome_data_dir(dir);
        }

        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(report) => {
            info!(
                path = %report.path.display(),
                rows = report.rows,
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: HarvestConfig) -> Result<ExportReport> {
    let rules = config.rules_path().map(RulesBook::load).unwrap_or_default();
    let sites = load_registry(config.registry_path(), &rules);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; stopping after in-flight work is abandoned");
                cancel.cancel();
            }
        })
    };

    let dispatcher = Dispatcher::new(
        Arc::new(config.light_extractor()),
        Arc::new(ChromiumRuntime::new(config.heavy_options())),
        config.header_rotation(),
        config.dispatch_options(),
    );
    let result = dispatcher.run(sites, &cancel).await;
    interrupt.abort();

    if !result.failures.is_empty() {
        warn!("{}", result.failure_summary().trim_end());
    }
    if result.interrupted {
        warn!("Run was interrupted; exporting partial results");
    }

    let output = config.output_path().clone();
    let records = result.records;
    let exported = tokio::task::spawn_blocking(move || export_jobs(&records, &output))
        .await
        .context("Export task failed")?;
    let report = exported.context("Failed to write results")?;

    if result.interrupted {
        info!("Shutdown complete");
    }
    Ok(report)
}
