//! billtext: converts bill attachments to plain text.
//!
//! Downloads every pending attachment of a bill, runs it through the matching
//! converter, and stores the text in the bill document table.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billtext_core::FailurePolicy;
use billtext_db::{log_pool_metrics, Database, PoolConfig, TableName};
use billtext_jobs::{
    AttachmentExtractor, ConversionConfig, ConversionJob, ExtractionRegistry, HttpFetcher,
    JobOptions, ScratchDir,
};

const DEFAULT_LOG_FILTER: &str =
    "billtext=info,billtext_jobs=info,billtext_db=info,reqwest=warn,hyper=warn";

#[derive(Parser)]
#[command(name = "billtext")]
#[command(author, version, about = "Bill attachment text conversion")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert attachment documents to plain text
    #[command(name = "convert_attachment_text")]
    ConvertAttachmentText {
        /// Convert every attachment without text, ignoring when text was last added
        #[arg(long = "update_all", alias = "update-all")]
        update_all: bool,

        /// Log and skip attachments that cannot be fetched or converted
        #[arg(long = "skip_failures", alias = "skip-failures")]
        skip_failures: bool,
    },

    /// Report which external converters are installed
    #[command(name = "check_extractors")]
    CheckExtractors,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _file_guard = init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "billtext failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConversionConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::ConvertAttachmentText {
            update_all,
            skip_failures,
        } => convert_attachment_text(config, update_all, skip_failures).await,
        Commands::CheckExtractors => check_extractors(config).await,
    }
}

async fn convert_attachment_text(
    config: ConversionConfig,
    update_all: bool,
    skip_failures: bool,
) -> anyhow::Result<()> {
    let table = TableName::parse(&config.table)
        .with_context(|| format!("Invalid table name '{}'", config.table))?;
    let pool_config = PoolConfig::new().time_zone(Some(config.time_zone.clone()));
    let db = Database::connect(&config.database_url, pool_config, table)
        .await
        .context("Failed to connect to database")?;

    let scratch = match &config.scratch_dir {
        Some(dir) => ScratchDir::at(dir)?,
        None => ScratchDir::temporary()?,
    };
    let extractor = AttachmentExtractor::new(
        Arc::new(HttpFetcher::new(config.fetch_timeout)?),
        ExtractionRegistry::with_defaults(config.extraction_timeout),
        scratch,
    );

    let failure_policy = if skip_failures {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };
    let options = JobOptions::default()
        .with_update_all(update_all)
        .with_batch_size(config.batch_size)
        .with_recent_limit(config.recent_limit)
        .with_failure_policy(failure_policy);

    let pool = db.pool.clone();
    let job = ConversionJob::new(Arc::new(db.attachments), extractor, options);
    let result = job.run().await;

    log_pool_metrics(&pool);
    pool.close().await;

    let summary = result?;
    if summary.skipped > 0 {
        warn!(
            skipped = summary.skipped,
            "Some attachments were skipped and remain pending"
        );
    }
    Ok(())
}

async fn check_extractors(config: ConversionConfig) -> anyhow::Result<()> {
    let registry = ExtractionRegistry::with_defaults(config.extraction_timeout);
    let mut results: Vec<_> = registry.health_check_all().await.into_iter().collect();
    results.sort_by_key(|(strategy, _)| strategy.to_string());

    let mut missing = Vec::new();
    for (strategy, healthy) in results {
        if healthy {
            info!(strategy = %strategy, "Converter available");
        } else {
            warn!(strategy = %strategy, "Converter not installed");
            missing.push(strategy.to_string());
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("Missing converters: {}", missing.join(", "));
    }
    info!("All converters available");
    Ok(())
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("billtext.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}
