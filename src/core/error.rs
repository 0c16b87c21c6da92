//! Error type shared by the library.

use thiserror::Error;

/// Coarse classification of an [`AppError`], used by front-ends to pick a
/// response shape (bad request, not found, server fault) without matching on
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller supplied something unusable.
    Input,
    /// An input resource could not be decoded or unpacked.
    Decode,
    /// A lookup found nothing to return.
    NotFound,
    /// Anything else: configuration, I/O, runtime faults.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Decode => "decode",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("No file uploaded")]
    NoFileProvided,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Uploaded file '{0}' is empty")]
    EmptyUpload(String),

    #[error("Unsupported file type '{0}'. Please upload a CSV or ZIP file")]
    UnsupportedFileType(String),

    #[error("Uploaded file is {size} bytes, exceeding the {limit} byte limit")]
    UploadTooLarge { size: usize, limit: usize },

    #[error("No valid emails found")]
    NoCandidates,

    #[error("No results available. Please run validation first.")]
    ArtifactNotFound,

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::NoFileProvided
            | AppError::NoFileSelected
            | AppError::EmptyUpload(_)
            | AppError::UnsupportedFileType(_)
            | AppError::UploadTooLarge { .. }
            | AppError::NoCandidates => ErrorCategory::Input,
            AppError::Archive(_) | AppError::Csv(_) => ErrorCategory::Decode,
            AppError::ArtifactNotFound => ErrorCategory::NotFound,
            AppError::Config(_)
            | AppError::Initialization(_)
            | AppError::Io(_)
            | AppError::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(AppError::NoCandidates.category(), ErrorCategory::Input);
        assert_eq!(
            AppError::UnsupportedFileType("a.txt".into()).category(),
            ErrorCategory::Input
        );
        assert!(AppError::ArtifactNotFound.is_not_found());
        assert_eq!(
            AppError::Internal("boom".into()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_messages_match_front_end_wording() {
        assert_eq!(AppError::NoCandidates.to_string(), "No valid emails found");
        assert_eq!(AppError::NoFileSelected.to_string(), "No file selected");
    }
}
