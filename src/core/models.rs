//! Records produced by the validation pipeline.

use serde::{Deserialize, Serialize};

/// Final classification of one candidate address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    InvalidSyntax,
    InvalidDomain,
    Error,
}

impl ValidationStatus {
    pub fn is_valid(self) -> bool {
        self == ValidationStatus::Valid
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::InvalidSyntax => "invalid syntax",
            ValidationStatus::InvalidDomain => "invalid domain",
            ValidationStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Result of validating a single address. Produced once per candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub email: String,
    pub syntax_valid: bool,
    pub domain_exists: bool,
    pub status: ValidationStatus,
    /// Why the address failed syntax checks, or the fault message for `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationOutcome {
    pub(crate) fn valid(email: String) -> Self {
        Self {
            email,
            syntax_valid: true,
            domain_exists: true,
            status: ValidationStatus::Valid,
            detail: None,
        }
    }

    pub(crate) fn invalid_syntax(email: String, reason: String) -> Self {
        Self {
            email,
            syntax_valid: false,
            domain_exists: false,
            status: ValidationStatus::InvalidSyntax,
            detail: Some(reason),
        }
    }

    pub(crate) fn invalid_domain(email: String) -> Self {
        Self {
            email,
            syntax_valid: true,
            domain_exists: false,
            status: ValidationStatus::InvalidDomain,
            detail: None,
        }
    }

    pub(crate) fn error(email: String, syntax_valid: bool, message: String) -> Self {
        Self {
            email,
            syntax_valid,
            domain_exists: false,
            status: ValidationStatus::Error,
            detail: Some(message),
        }
    }
}

/// Counts returned to the submitter once a batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub valid: usize,
    pub invalid: usize,
    pub total: usize,
}

/// Every outcome of one batch plus its derived counts.
///
/// `valid + invalid == total == outcomes.len()` holds by construction.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    outcomes: Vec<ValidationOutcome>,
    valid_count: usize,
    invalid_count: usize,
}

impl BatchResult {
    /// Tallies `outcomes`. Anything not classified `Valid` counts as invalid.
    pub fn from_outcomes(outcomes: Vec<ValidationOutcome>) -> Self {
        let valid_count = outcomes.iter().filter(|o| o.status.is_valid()).count();
        let invalid_count = outcomes.len() - valid_count;
        Self {
            outcomes,
            valid_count,
            invalid_count,
        }
    }

    pub fn outcomes(&self) -> &[ValidationOutcome] {
        &self.outcomes
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of outcomes with the given classification.
    pub fn count_status(&self, status: ValidationStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            valid: self.valid_count,
            invalid: self.invalid_count,
            total: self.total_count(),
        }
    }

    /// Addresses classified `Valid`, in outcome order.
    pub fn valid_emails(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_valid())
            .map(|o| o.email.as_str())
    }

    /// Builds the downloadable export of valid addresses.
    pub fn export_artifact(&self, filename: &str) -> crate::Result<Artifact> {
        Artifact::from_emails(self.valid_emails(), filename)
    }
}

/// CSV export of the valid addresses of one batch: an `Email` header
/// followed by one address per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    body: String,
    rows: usize,
    filename: String,
}

impl Artifact {
    pub const CONTENT_TYPE: &'static str = "text/csv";

    pub fn from_emails<'a, I>(emails: I, filename: &str) -> crate::Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Email"])?;
        let mut rows = 0;
        for email in emails {
            writer.write_record([email])?;
            rows += 1;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::AppError::Internal(format!("Failed to flush CSV export: {}", e)))?;
        let body = String::from_utf8(bytes)
            .map_err(|e| crate::AppError::Internal(format!("CSV export is not UTF-8: {}", e)))?;
        Ok(Self {
            body,
            rows,
            filename: filename.to_string(),
        })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of address rows, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    /// `attachment` header value with the filename as a quoted string.
    pub fn content_disposition(&self) -> String {
        let mut quoted = String::with_capacity(self.filename.len());
        for c in self.filename.chars().filter(|c| !c.is_control()) {
            if matches!(c, '"' | '\\') {
                quoted.push('\\');
            }
            quoted.push(c);
        }
        format!("attachment; filename=\"{}\"", quoted)
    }

    /// Addresses in the export, in row order.
    pub fn emails(&self) -> Vec<&str> {
        self.body.lines().skip(1).filter(|l| !l.is_empty()).collect()
    }
}
