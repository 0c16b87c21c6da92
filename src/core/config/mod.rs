//! Runtime configuration for the validator.
//!
//! A [`Config`] is assembled by [`ConfigBuilder`]: defaults, then an optional
//! TOML file, then explicit overrides, then validation.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;
pub(crate) use validation::parse_name_server;

pub(crate) use crate::core::error::Result;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent validation tasks.
pub const DEFAULT_MAX_CONCURRENCY: usize = 30;
/// Upper bound for a single domain resolution attempt.
pub const MAX_DNS_TIMEOUT: Duration = Duration::from_secs(2);
/// Default upload size limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Effective settings used by the extractor, resolver and worker pool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Width of the worker pool.
    pub max_concurrency: usize,
    /// Time bound for each resolution step.
    pub dns_timeout: Duration,
    /// Upstream name servers (`ip` or `ip:port`). Empty means system configuration.
    pub dns_servers: Vec<String>,
    /// Domains added to the built-in allow-list at start-up.
    pub extra_known_domains: Vec<String>,
    pub max_upload_bytes: usize,
    /// Case-insensitive header fragments that identify the address column.
    pub column_hints: Vec<String>,
    /// Encoding labels tried, in order, when decoding a tabular resource.
    pub encodings: Vec<String>,
    /// Directory under which uploads are staged. `None` uses the system temp dir.
    pub staging_dir: Option<PathBuf>,
    /// Suggested download name for the valid-address export.
    pub artifact_filename: String,
    /// Path of the TOML file the config was loaded from, if any.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            dns_timeout: MAX_DNS_TIMEOUT,
            dns_servers: Vec::new(),
            extra_known_domains: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            column_hints: default_column_hints(),
            encodings: default_encodings(),
            staging_dir: None,
            artifact_filename: "valid_emails.csv".to_string(),
            loaded_config_path: None,
        }
    }
}

pub(crate) fn default_column_hints() -> Vec<String> {
    ["email", "mail", "e-mail"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn default_encodings() -> Vec<String> {
    ["utf-8", "latin1", "iso-8859-1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// On-disk shape of the TOML configuration file. Every field is optional so
/// a file only needs to mention what it changes. Builder overrides reuse the
/// same shape.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub validation: ValidationSection,
    pub dns: DnsSection,
    pub input: InputSection,
    pub output: OutputSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub dns_timeout_ms: Option<u64>,
    pub dns_servers: Option<Vec<String>>,
    pub extra_known_domains: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InputSection {
    pub max_upload_bytes: Option<usize>,
    pub column_hints: Option<Vec<String>>,
    pub encodings: Option<Vec<String>>,
    pub staging_dir: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub artifact_filename: Option<String>,
}
