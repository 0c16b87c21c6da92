//! # Email Sift CLI
//!
//! Command-line front-end for the Email Sift library (`email_sift_core`).
//! Parses arguments, builds configuration, submits one CSV or zip file as a
//! batch, writes the valid-address export and logs a summary.

use email_sift_core::{
    initialize_validator, BatchResult, ConfigBuilder, ErrorCategory, Upload, ValidationService,
    ValidationStatus,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Validates a bulk list of email addresses.",
    long_about = "Email Sift reads addresses from a CSV file (or a zip of CSV files), checks their syntax and whether their domains resolve, and exports the valid ones as CSV."
)]
struct AppArgs {
    /// Path to the input `.csv` or `.zip` file.
    #[arg(short, long, env = "EMAIL_SIFT_INPUT")]
    input: String,

    /// Path of the CSV export of valid addresses.
    #[arg(short, long, env = "EMAIL_SIFT_OUTPUT")]
    output: Option<String>,

    /// Optional path for a JSON report with every per-address outcome.
    #[arg(long, env = "EMAIL_SIFT_REPORT")]
    report: Option<String>,

    /// Print the `{valid, invalid, total}` summary as JSON to standard output.
    #[arg(long, default_value = "false", env = "EMAIL_SIFT_STDOUT")]
    stdout: bool,

    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "EMAIL_SIFT_CONFIG")]
    config_file: Option<String>,

    /// Maximum number of concurrent validation tasks.
    #[arg(short, long, env = "EMAIL_SIFT_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Timeout for each DNS resolution step, in milliseconds (at most 2000).
    #[arg(long, env = "EMAIL_SIFT_DNS_TIMEOUT_MS")]
    dns_timeout_ms: Option<u64>,

    /// Comma-separated list of DNS servers to use for lookups.
    #[arg(long, value_delimiter = ',', env = "EMAIL_SIFT_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,

    /// Comma-separated domains to treat as existing without a lookup.
    #[arg(long, value_delimiter = ',', env = "EMAIL_SIFT_KNOWN_DOMAINS")]
    known_domains: Option<Vec<String>>,

    /// Maximum accepted input size in bytes.
    #[arg(long, env = "EMAIL_SIFT_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Directory used to stage inputs during extraction (defaults to the system temp dir).
    #[arg(long, env = "EMAIL_SIFT_STAGING_DIR")]
    staging_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Email Sift CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let mut config_builder = ConfigBuilder::new();
    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if let Some(ms) = args.dns_timeout_ms {
        config_builder = config_builder.dns_timeout(Duration::from_millis(ms));
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            config_builder = config_builder.dns_servers(servers.clone());
        }
    }
    if let Some(ref domains) = args.known_domains {
        config_builder = config_builder.extra_known_domains(domains.clone());
    }
    if let Some(limit) = args.max_upload_bytes {
        config_builder = config_builder.max_upload_bytes(limit);
    }
    if let Some(ref dir) = args.staging_dir {
        config_builder = config_builder.staging_dir(dir);
    }

    let config = match config_builder.build() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let validator = match initialize_validator(&config).await {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize validator: {}", e));
        }
    };
    let service = ValidationService::new(Arc::clone(&config), validator)
        .context("Failed to create validation service")?;

    let start_time = Instant::now();
    let result = run_batch(&service, &args).await?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.artifact_filename.clone());
    save_artifact(&service, &output)?;
    if let Some(ref report) = args.report {
        save_report(&result, report)?;
    }

    log_summary(&result, start_time.elapsed());

    if args.stdout {
        let summary = serde_json::to_string(&result.summary())
            .context("Failed to serialize summary")?;
        println!("{}", summary);
    }

    Ok(())
}

async fn run_batch(service: &ValidationService, args: &AppArgs) -> Result<BatchResult> {
    let input_path = Path::new(&args.input);
    if !input_path.exists() || !input_path.is_file() {
        return Err(anyhow::anyhow!(
            "Input file not found or is not a file: {}",
            args.input
        ));
    }
    let size = std::fs::metadata(input_path)
        .with_context(|| format!("Failed to stat input file '{}'", args.input))?
        .len();
    let limit = service.config().max_upload_bytes;
    if size > limit as u64 {
        return Err(anyhow::anyhow!(
            "Input file '{}' is {} bytes, exceeding the {} byte limit",
            args.input,
            size,
            limit
        ));
    }

    tracing::info!("Loading '{}'...", args.input);
    let bytes = std::fs::read(input_path)
        .with_context(|| format!("Failed to read input file '{}'", args.input))?;
    let filename = input_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Failed to set progress bar template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Validating emails from {}...", filename));

    let submitted = service.submit_detailed(Some(Upload::new(filename, bytes))).await;
    match submitted {
        Ok(result) => {
            pb.finish_with_message(format!("Validated {} emails", result.total_count()));
            Ok(result)
        }
        Err(e) => {
            pb.finish_and_clear();
            match e.category() {
                ErrorCategory::Input => tracing::error!("Rejected input: {}", e),
                category => tracing::error!("Batch failed ({}): {}", category, e),
            }
            Err(anyhow::anyhow!("Validation of '{}' failed: {}", args.input, e))
        }
    }
}

/// Writes the CSV export of valid addresses for the batch just processed.
fn save_artifact(service: &ValidationService, file_path: &str) -> Result<()> {
    let artifact = service
        .retrieve_artifact()
        .context("No export available after validation")?;
    if let Some(parent_dir) = Path::new(file_path).parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!("Failed to create output directory '{}'", parent_dir.display())
            })?;
        }
    }
    std::fs::write(file_path, artifact.body())
        .with_context(|| format!("Failed to write export to '{}'", file_path))?;
    tracing::info!("Saved {} valid emails to '{}'.", artifact.rows(), file_path);
    Ok(())
}

/// Saves every per-address outcome as pretty-printed JSON.
fn save_report(result: &BatchResult, file_path: &str) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create/truncate report file '{}'", file_path))?;
    let writer = BufWriter::new(file);
    tracing::debug!("Writing {} outcomes to {}", result.total_count(), file_path);
    serde_json::to_writer_pretty(writer, result.outcomes())
        .with_context(|| format!("Failed to serialize report to JSON for '{}'", file_path))?;
    Ok(())
}

fn log_summary(result: &BatchResult, duration: Duration) {
    let total = result.total_count();
    tracing::info!("-------------------- Validation Summary --------------------");
    tracing::info!("Total Emails Checked    : {}", total);
    tracing::info!("  - Valid               : {}", result.valid_count());
    tracing::info!("  - Invalid             : {}", result.invalid_count());
    tracing::info!(
        "      Syntax            : {}",
        result.count_status(ValidationStatus::InvalidSyntax)
    );
    tracing::info!(
        "      Domain            : {}",
        result.count_status(ValidationStatus::InvalidDomain)
    );
    tracing::info!(
        "      Errors            : {}",
        result.count_status(ValidationStatus::Error)
    );
    tracing::info!("Total Time Taken        : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && total > 0 {
        let rate = (total as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate         : {:.2} emails/sec", rate);
    }
    tracing::info!("------------------------------------------------------------");
}
