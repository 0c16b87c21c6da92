//! Contains validation logic for the final Config struct.

use super::{default_column_hints, Config, Result, MAX_DNS_TIMEOUT};
use crate::core::error::AppError;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Validates the configuration after loading and overrides, clamping values
/// where a sensible correction exists.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.dns_timeout == Duration::ZERO {
        return Err(AppError::Config(
            "DNS timeout must be greater than zero.".to_string(),
        ));
    }
    if config.dns_timeout > MAX_DNS_TIMEOUT {
        tracing::warn!(
            "DNS timeout ({:?}) exceeds the {:?} bound. Clamping.",
            config.dns_timeout,
            MAX_DNS_TIMEOUT
        );
        config.dns_timeout = MAX_DNS_TIMEOUT;
    }
    for server in &config.dns_servers {
        if parse_name_server(server).is_none() {
            return Err(AppError::Config(format!(
                "Invalid DNS server address: {}",
                server
            )));
        }
    }
    if config.max_upload_bytes == 0 {
        return Err(AppError::Config(
            "Maximum upload size must be greater than zero.".to_string(),
        ));
    }
    config.column_hints.retain(|h| !h.is_empty());
    if config.column_hints.is_empty() {
        tracing::warn!("Column hints list is empty. Restoring defaults.");
        config.column_hints = default_column_hints();
    }
    if config.encodings.is_empty() {
        return Err(AppError::Config(
            "At least one input encoding must be configured.".to_string(),
        ));
    }
    for label in &config.encodings {
        if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
            return Err(AppError::Config(format!("Unknown encoding label: {}", label)));
        }
    }
    if let Some(ref dir) = config.staging_dir {
        if !dir.is_dir() {
            return Err(AppError::Config(format!(
                "Staging directory does not exist: {}",
                dir.display()
            )));
        }
    }
    if config.artifact_filename.is_empty() {
        tracing::warn!("Artifact filename is empty. Using 'valid_emails.csv'.");
        config.artifact_filename = "valid_emails.csv".to_string();
    }
    Ok(())
}

/// Parses `ip` or `ip:port` (port 53 implied).
pub(crate) fn parse_name_server(value: &str) -> Option<SocketAddr> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some(addr);
    }
    value
        .parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, 53))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_concurrency_clamped() {
        let mut config = Config {
            max_concurrency: 0,
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_dns_timeout_bounds() {
        let mut config = Config {
            dns_timeout: Duration::from_secs(10),
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.dns_timeout, Duration::from_secs(2));

        let mut config = Config {
            dns_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }

    #[test]
    fn test_default_encodings_are_known_labels() {
        let mut config = Config::default();
        validate_config(&mut config).unwrap();
        for label in &config.encodings {
            assert!(encoding_rs::Encoding::for_label(label.as_bytes()).is_some());
        }
    }

    #[test]
    fn test_missing_staging_dir_rejected() {
        let mut config = Config {
            staging_dir: Some("/definitely/not/here".into()),
            ..Config::default()
        };
        assert!(matches!(validate_config(&mut config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let mut config = Config {
            encodings: vec!["utf-8".into(), "klingon".into()],
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }

    #[test]
    fn test_empty_hints_restored() {
        let mut config = Config {
            column_hints: vec![String::new()],
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.column_hints, default_column_hints());
    }

    #[test]
    fn test_name_server_parsing() {
        assert_eq!(
            parse_name_server("1.1.1.1"),
            Some("1.1.1.1:53".parse().unwrap())
        );
        assert_eq!(
            parse_name_server("8.8.8.8:5353"),
            Some("8.8.8.8:5353".parse().unwrap())
        );
        assert!(parse_name_server("dns.example").is_none());

        let mut config = Config {
            dns_servers: vec!["not-an-ip".into()],
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }
}
