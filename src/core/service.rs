//! Submit-a-batch / retrieve-the-export boundary used by front-ends.
//!
//! A front-end (CLI, HTTP handler) hands over one uploaded file; the service
//! stages it on disk for extraction, runs the worker pool over the extracted
//! candidates, stores the export of valid addresses and returns the counts.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{Artifact, BatchResult, BatchSummary};
use crate::core::store::ArtifactStore;
use crate::core::validator::EmailValidator;
use crate::utils::extract::AddressExtractor;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// One uploaded file as received from the front-end.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Accepted upload kinds, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Zip,
}

impl UploadKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(UploadKind::Csv)
        } else if ext.eq_ignore_ascii_case("zip") {
            Some(UploadKind::Zip)
        } else {
            None
        }
    }
}

/// Reduces a client-supplied name to a safe single path component made of
/// ASCII alphanumerics, `.`, `_` and `-`.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let base = base_name(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Last path component of a client-supplied name, for either separator.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or("")
}

/// On-disk name for a staged upload. The extension always matches `kind`;
/// a stem with nothing safe left in it becomes `upload`.
pub(crate) fn staging_filename(name: &str, kind: UploadKind) -> String {
    let ext = match kind {
        UploadKind::Csv => "csv",
        UploadKind::Zip => "zip",
    };
    let base = base_name(name);
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_filename)
        .unwrap_or_default();
    if stem.is_empty() {
        format!("upload.{}", ext)
    } else {
        format!("{}.{}", stem, ext)
    }
}

pub struct ValidationService {
    config: Arc<Config>,
    validator: Arc<EmailValidator>,
    extractor: AddressExtractor,
    store: ArtifactStore,
}

impl ValidationService {
    pub fn new(config: Arc<Config>, validator: Arc<EmailValidator>) -> Result<Self> {
        let extractor = AddressExtractor::new(&config)?;
        Ok(Self {
            config,
            validator,
            extractor,
            store: ArtifactStore::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates an upload and returns `{valid, invalid, total}`.
    pub async fn submit(&self, upload: Option<Upload>) -> Result<BatchSummary> {
        self.submit_detailed(upload).await.map(|r| r.summary())
    }

    /// Like [`submit`](Self::submit) but returns every outcome.
    pub async fn submit_detailed(&self, upload: Option<Upload>) -> Result<BatchResult> {
        let upload = upload.ok_or(AppError::NoFileProvided)?;
        if upload.filename.trim().is_empty() {
            return Err(AppError::NoFileSelected);
        }
        let kind = UploadKind::from_filename(base_name(&upload.filename))
            .ok_or_else(|| AppError::UnsupportedFileType(upload.filename.clone()))?;
        let filename = staging_filename(&upload.filename, kind);
        if upload.bytes.len() > self.config.max_upload_bytes {
            return Err(AppError::UploadTooLarge {
                size: upload.bytes.len(),
                limit: self.config.max_upload_bytes,
            });
        }
        if upload.bytes.is_empty() {
            return Err(AppError::EmptyUpload(filename));
        }

        tracing::info!(target: "service", "Processing upload '{}' ({} bytes)", filename, upload.bytes.len());
        let start_time = Instant::now();

        let candidates = self.extract_upload(filename.clone(), kind, upload.bytes).await?;
        tracing::info!(target: "service", "Found {} candidate emails in '{}'", candidates.len(), filename);
        if candidates.is_empty() {
            return Err(AppError::NoCandidates);
        }

        let submitted = candidates.len();
        let outcomes =
            crate::process_emails(Arc::clone(&self.config), Arc::clone(&self.validator), candidates)
                .await;
        if outcomes.len() != submitted {
            tracing::error!(target: "service",
                "Worker pool returned {} outcomes for {} candidates.", outcomes.len(), submitted);
            return Err(AppError::Internal(format!(
                "Validation produced {} outcomes for {} addresses",
                outcomes.len(),
                submitted
            )));
        }

        let result = BatchResult::from_outcomes(outcomes);
        let artifact = result.export_artifact(&self.config.artifact_filename)?;
        self.store.replace(artifact);

        tracing::info!(target: "service",
            "Done! Valid: {}, Invalid: {}, Total: {} ({:.2?})",
            result.valid_count(), result.invalid_count(), result.total_count(), start_time.elapsed());
        Ok(result)
    }

    /// The export of the most recent completed batch.
    pub fn retrieve_artifact(&self) -> Result<Arc<Artifact>> {
        match self.store.latest() {
            Some(artifact) => {
                tracing::debug!(target: "service", "Serving artifact with {} valid emails.", artifact.rows());
                Ok(artifact)
            }
            None => {
                tracing::warn!(target: "service", "Artifact requested before any batch completed.");
                Err(AppError::ArtifactNotFound)
            }
        }
    }

    /// Writes the upload into a private temporary directory and extracts
    /// candidates from it on the blocking pool. The directory is removed
    /// when extraction finishes, whatever the outcome.
    async fn extract_upload(
        &self,
        filename: String,
        kind: UploadKind,
        bytes: Vec<u8>,
    ) -> Result<Vec<String>> {
        let extractor = self.extractor.clone();
        let staging_root = self.config.staging_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("email-sift-upload-");
            let staging = match staging_root {
                Some(ref root) => builder.tempdir_in(root)?,
                None => builder.tempdir()?,
            };
            let path = staging.path().join(&filename);
            std::fs::write(&path, &bytes)?;
            let candidates = match kind {
                UploadKind::Csv => extractor.extract_csv_file(&path),
                UploadKind::Zip => extractor.extract_archive(&path),
            };
            drop(staging);
            Ok(candidates)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
    }
}
