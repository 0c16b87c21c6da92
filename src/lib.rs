//! # Email Sift Core Library
//!
//! Bulk email address validation: candidate extraction from CSV files or zip
//! archives of CSV files, structural syntax checks, domain existence lookups
//! over a bounded pool of concurrent tasks, and a CSV export of the addresses
//! that passed.
//!
//! Used directly as a library or via the `email-sift` command-line tool.

mod core;
mod utils;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, ErrorCategory, Result};
pub use crate::core::models::{
    Artifact, BatchResult, BatchSummary, ValidationOutcome, ValidationStatus,
};
pub use crate::core::service::{Upload, UploadKind, ValidationService};
pub use crate::core::store::ArtifactStore;
pub use crate::core::validator::EmailValidator;
pub use crate::utils::dns::{DomainResolver, KnownDomainResolver, NetworkResolver};
pub use crate::utils::domain::{KnownDomains, COMMON_DOMAINS};
pub use crate::utils::extract::{normalize_candidate, AddressExtractor};
pub use crate::utils::syntax::{check_syntax, is_valid_syntax, SyntaxViolation};

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

/// Initializes the allow-list and DNS resolver.
/// Essential for creating an `EmailValidator` instance.
pub async fn initialize_validator(config: &Config) -> Result<EmailValidator> {
    EmailValidator::new(config).await
}

/// Validates one address: syntax, then (if syntactic) domain existence.
///
/// Never fails; faults are reported as an outcome with status `Error`.
pub async fn validate_single_email(validator: &EmailValidator, email: &str) -> ValidationOutcome {
    tracing::debug!(target: "validate_task", "[{}] Starting validation.", email);
    let outcome = validator.check_email(email).await;
    tracing::debug!(target: "validate_task", "[{}] Finished: {}", email, outcome.status);
    outcome
}

/// Validates every address in `emails` with at most `config.max_concurrency`
/// tasks in flight.
///
/// Returns exactly one outcome per input address, in completion order (not
/// input order). A task that panics or is cancelled still yields an `Error`
/// outcome for its address.
///
/// # Arguments
/// * `config` - The application configuration.
/// * `validator` - An Arc-wrapped, initialized `EmailValidator` for sharing.
/// * `emails` - Normalized candidate addresses; duplicates are validated separately.
pub async fn process_emails(
    config: Arc<Config>,
    validator: Arc<EmailValidator>,
    emails: Vec<String>,
) -> Vec<ValidationOutcome> {
    let total_records = emails.len();
    if total_records == 0 {
        return Vec::new();
    }
    let max_concurrency = config.max_concurrency.max(1);
    tracing::info!(
        "Validating {} emails (Concurrency: {})...",
        total_records,
        max_concurrency
    );

    let mut tasks = FuturesUnordered::new();
    let mut results = Vec::with_capacity(total_records);

    for email in emails {
        while tasks.len() >= max_concurrency {
            if let Some((done_email, join_result)) = tasks.next().await {
                results.push(collect_outcome(done_email, join_result));
            } else {
                tracing::warn!("Task queue unexpectedly empty while limiting concurrency.");
                break;
            }
        }

        let validator_clone = Arc::clone(&validator);
        let task_email = email.clone();
        let handle = tokio::spawn(async move {
            validate_single_email(&validator_clone, &task_email).await
        });
        tasks.push(async move { (email, handle.await) });
    }

    while let Some((email, join_result)) = tasks.next().await {
        results.push(collect_outcome(email, join_result));
    }

    tracing::debug!("Collected {} outcomes for {} emails.", results.len(), total_records);
    results
}

fn collect_outcome(
    email: String,
    join_result: std::result::Result<ValidationOutcome, tokio::task::JoinError>,
) -> ValidationOutcome {
    match join_result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Validation task for <{}> failed to join: {}", email, e);
            let syntax_valid = is_valid_syntax(&email);
            ValidationOutcome::error(email, syntax_valid, format!("Validation task failed: {}", e))
        }
    }
}
