//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_files: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not probe `./email-sift.toml` / `./config.toml` when no explicit file is given.
    pub fn skip_default_files(mut self) -> Self {
        self.skip_default_files = true;
        self
    }

    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.validation.max_concurrency = Some(value);
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }
    pub fn extra_known_domains(mut self, domains: Vec<String>) -> Self {
        self.overrides.dns.extra_known_domains = Some(domains);
        self
    }
    pub fn max_upload_bytes(mut self, value: usize) -> Self {
        self.overrides.input.max_upload_bytes = Some(value);
        self
    }
    pub fn column_hints(mut self, hints: Vec<String>) -> Self {
        self.overrides.input.column_hints = Some(hints);
        self
    }
    pub fn encodings(mut self, labels: Vec<String>) -> Self {
        self.overrides.input.encodings = Some(labels);
        self
    }
    pub fn staging_dir(mut self, dir: impl Into<String>) -> Self {
        self.overrides.input.staging_dir = Some(dir.into());
        self
    }
    pub fn artifact_filename(mut self, value: impl Into<String>) -> Self {
        self.overrides.output.artifact_filename = Some(value.into());
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_files {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./email-sift.toml", "./config.toml"] {
                if !Path::new(path_str).exists() {
                    continue;
                }
                tracing::debug!("Found potential default config file: {}", path_str);
                match load_config_file(path_str) {
                    Ok(file_config) => {
                        apply_file_config(&mut self.config, &file_config);
                        loaded_path = Some(path_str.to_string());
                        tracing::info!(
                            "Loaded base configuration from default location: {}",
                            path_str
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load or parse default config '{}': {}",
                            path_str,
                            e
                        );
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
