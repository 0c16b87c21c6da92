//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads configuration settings from a TOML file.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Merges the settings present in `file_config` onto `config`.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Validation
    if let Some(concurrency) = file_config.validation.max_concurrency {
        config.max_concurrency = concurrency;
    }

    // DNS
    if let Some(timeout_ms) = file_config.dns.dns_timeout_ms {
        config.dns_timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(ref servers) = file_config.dns.dns_servers {
        config.dns_servers = servers
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(ref domains) = file_config.dns.extra_known_domains {
        config.extra_known_domains = domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
    }

    // Input
    if let Some(limit) = file_config.input.max_upload_bytes {
        config.max_upload_bytes = limit;
    }
    if let Some(ref hints) = file_config.input.column_hints {
        config.column_hints = hints.iter().map(|h| h.trim().to_lowercase()).collect();
    }
    if let Some(ref labels) = file_config.input.encodings {
        config.encodings = labels.iter().map(|l| l.trim().to_string()).collect();
    }
    if let Some(ref dir) = file_config.input.staging_dir {
        let dir = dir.trim();
        config.staging_dir = if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        };
    }

    // Output
    if let Some(ref name) = file_config.output.artifact_filename {
        config.artifact_filename = name.trim().to_string();
    }
}
