//! Pulls candidate addresses out of tabular (CSV) resources.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::utils::archive::expand_archive;

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::path::Path;

/// Cell values that stand for "no value" in exported spreadsheets.
const MISSING_VALUE_TOKENS: [&str; 6] = ["nan", "none", "null", "n/a", "na", "<na>"];

/// Turns raw cell text into a candidate address, or `None` if it cannot be one.
pub fn normalize_candidate(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() || MISSING_VALUE_TOKENS.contains(&value.as_str()) {
        return None;
    }
    if !value.contains('@') || !value.contains('.') {
        return None;
    }
    Some(value)
}

/// Reads CSV resources and returns normalized candidate addresses in row order.
///
/// Duplicates are kept.
#[derive(Debug, Clone)]
pub struct AddressExtractor {
    column_hints: Vec<String>,
    encodings: Vec<&'static Encoding>,
}

impl AddressExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        let encodings = config
            .encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| AppError::Config(format!("Unknown encoding label: {}", label)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            column_hints: config
                .column_hints
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            encodings,
        })
    }

    /// Extracts from one in-memory CSV resource. `source` is only used in logs.
    ///
    /// The resource is decoded with each configured encoding in turn; the first
    /// one that decodes cleanly and yields a readable header wins. A resource
    /// no encoding can read contributes nothing.
    pub fn extract_csv_bytes(&self, bytes: &[u8], source: &str) -> Vec<String> {
        for &encoding in &self.encodings {
            let Some(text) = decode_strict(bytes, encoding) else {
                tracing::debug!(target: "extract", "{} is not valid {}", source, encoding.name());
                continue;
            };
            match self.read_rows(&text, source) {
                Ok(candidates) => {
                    tracing::debug!(target: "extract",
                        "Read {} candidates from {} as {}", candidates.len(), source, encoding.name());
                    return candidates;
                }
                Err(e) => {
                    tracing::debug!(target: "extract",
                        "Could not parse {} as {}: {}", source, encoding.name(), e);
                }
            }
        }
        tracing::warn!(target: "extract", "Skipping {}: unreadable under all configured encodings.", source);
        Vec::new()
    }

    /// Extracts from a CSV file on disk. Read failures skip the file.
    pub fn extract_csv_file(&self, path: &Path) -> Vec<String> {
        match std::fs::read(path) {
            Ok(bytes) => self.extract_csv_bytes(&bytes, &path.display().to_string()),
            Err(e) => {
                tracing::warn!(target: "extract", "Skipping {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Extracts from every CSV inside a zip archive, concatenated in archive
    /// order. The archive is unpacked into a temporary directory that is
    /// removed before this returns.
    pub fn extract_archive(&self, path: &Path) -> Vec<String> {
        let extracted = match expand_archive(path) {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!(target: "extract", "Could not expand archive {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        tracing::debug!(target: "extract",
            "Expanded archive {} into {}", path.display(), extracted.root().display());
        let mut all = Vec::new();
        for csv_path in extracted.csv_files() {
            all.extend(self.extract_csv_file(csv_path));
        }
        tracing::info!(target: "extract",
            "Archive {}: {} CSV files, {} candidates.", path.display(), extracted.csv_files().len(), all.len());
        all
    }

    fn read_rows(&self, text: &str, source: &str) -> Result<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        let column = self.select_column(&headers);
        tracing::debug!(target: "extract",
            "Using column {} ('{}') of {}", column, headers.get(column).unwrap_or(""), source);

        let mut candidates = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            match record {
                Ok(record) => {
                    if let Some(candidate) = record.get(column).and_then(normalize_candidate) {
                        candidates.push(candidate);
                    }
                }
                Err(e) => {
                    skipped += 1;
                    tracing::trace!(target: "extract", "Skipping malformed row in {}: {}", source, e);
                }
            }
        }
        if skipped > 0 {
            tracing::debug!(target: "extract", "Skipped {} malformed rows in {}", skipped, source);
        }
        Ok(candidates)
    }

    /// First header containing any hint, else the first column.
    fn select_column(&self, headers: &csv::StringRecord) -> usize {
        headers
            .iter()
            .position(|name| {
                let name = name.to_lowercase();
                self.column_hints.iter().any(|hint| name.contains(hint.as_str()))
            })
            .unwrap_or(0)
    }
}

/// Decodes without replacement characters; `None` if the bytes are malformed
/// for `encoding`. A UTF-8 byte order mark is dropped.
fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
    } else {
        bytes
    };
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::archive::tests::write_zip;

    fn extractor() -> AddressExtractor {
        AddressExtractor::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_normalize_candidate() {
        assert_eq!(
            normalize_candidate("  John.Doe@Example.COM "),
            Some("john.doe@example.com".to_string())
        );
        assert_eq!(normalize_candidate(""), None);
        assert_eq!(normalize_candidate("NaN"), None);
        assert_eq!(normalize_candidate("no-at-sign.com"), None);
        assert_eq!(normalize_candidate("user@localhost"), None);
        // Shape problems are left for the syntax check.
        assert_eq!(normalize_candidate("@."), Some("@.".to_string()));
    }

    #[test]
    fn test_prefers_email_like_column() {
        let csv = b"name,E-Mail Address,phone\nAnn,ANN@X.COM,1\nBob,bob@y.org,2\n";
        assert_eq!(
            extractor().extract_csv_bytes(csv, "test"),
            vec!["ann@x.com", "bob@y.org"]
        );
    }

    #[test]
    fn test_falls_back_to_first_column() {
        let csv = b"contact,name\na@x.com,Ann\nb@y.org,Bob\n";
        assert_eq!(
            extractor().extract_csv_bytes(csv, "test"),
            vec!["a@x.com", "b@y.org"]
        );
    }

    #[test]
    fn test_filters_and_keeps_duplicates() {
        let csv = b"email\na@x.com\n\nnan\nnot-an-address\n  A@X.com  \nb@y.org\n";
        assert_eq!(
            extractor().extract_csv_bytes(csv, "test"),
            vec!["a@x.com", "a@x.com", "b@y.org"]
        );
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let csv = b"id,email\n1,a@x.com\n2,b@y.org,extra\n3\n4,c@z.net\n";
        assert_eq!(
            extractor().extract_csv_bytes(csv, "test"),
            vec!["a@x.com", "c@z.net"]
        );
    }

    #[test]
    fn test_latin1_fallback() {
        // "José" in ISO-8859-1 is not valid UTF-8.
        let mut csv = b"name,email\nJos".to_vec();
        csv.push(0xE9);
        csv.extend_from_slice(b",jose@x.com\n");
        assert_eq!(extractor().extract_csv_bytes(&csv, "test"), vec!["jose@x.com"]);
    }

    #[test]
    fn test_unreadable_resource_contributes_nothing() {
        let config = Config {
            encodings: vec!["utf-8".to_string()],
            ..Config::default()
        };
        let extractor = AddressExtractor::new(&config).unwrap();
        let csv = [b'e', b'm', b'a', b'i', b'l', b'\n', 0xFF, 0xFE, b'\n'];
        assert!(extractor.extract_csv_bytes(&csv, "test").is_empty());
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let csv = b"\xEF\xBB\xBFEmail\na@x.com\n";
        assert_eq!(extractor().extract_csv_bytes(csv, "test"), vec!["a@x.com"]);
    }

    #[test]
    fn test_empty_resource() {
        assert!(extractor().extract_csv_bytes(b"", "test").is_empty());
        assert!(extractor().extract_csv_bytes(b"email\n", "test").is_empty());
    }

    #[test]
    fn test_archive_concatenates_in_order() {
        let scratch = tempfile::tempdir().unwrap();
        let zip_path = scratch.path().join("batch.zip");
        write_zip(
            &zip_path,
            &[
                ("first.csv", b"email\nb@x.com\nc@x.com\n"),
                ("readme.md", b"ignore me"),
                ("second.csv", b"name,mail\nAnn,a@y.org\n"),
            ],
        );
        assert_eq!(
            extractor().extract_archive(&zip_path),
            vec!["b@x.com", "c@x.com", "a@y.org"]
        );
    }

    #[test]
    fn test_corrupt_archive_yields_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let zip_path = scratch.path().join("broken.zip");
        std::fs::write(&zip_path, b"PK not really").unwrap();
        assert!(extractor().extract_archive(&zip_path).is_empty());
    }
}
