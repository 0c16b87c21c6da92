//! Domain existence checks.
//!
//! Resolution is layered: [`KnownDomainResolver`] answers from the allow-list
//! and only defers to its fallback (normally [`NetworkResolver`]) for domains
//! it does not know.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::utils::domain::KnownDomains;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Answers "does this domain exist?".
///
/// `Ok(false)` covers every ordinary resolution failure (timeout, NXDOMAIN,
/// network errors). `Err` is reserved for faults inside the resolver itself;
/// the worker pool classifies those as `error` outcomes.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    async fn domain_exists(&self, domain: &str) -> Result<bool>;
}

#[async_trait]
impl<T: DomainResolver + ?Sized> DomainResolver for Arc<T> {
    async fn domain_exists(&self, domain: &str) -> Result<bool> {
        (**self).domain_exists(domain).await
    }
}

/// Builds the async resolver from config: explicit name servers if given,
/// otherwise the host's resolver configuration.
pub(crate) fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let (resolver_config, mut opts) = if config.dns_servers.is_empty() {
        match trust_dns_resolver::system_conf::read_system_conf() {
            Ok(system) => {
                tracing::debug!(target: "dns", "Using system resolver configuration.");
                system
            }
            Err(e) => {
                tracing::warn!(target: "dns",
                    "Could not read system resolver configuration ({}). Falling back to defaults.", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        }
    } else {
        let mut group = NameServerConfigGroup::new();
        for server in &config.dns_servers {
            let addr: SocketAddr =
                crate::core::config::parse_name_server(server).ok_or_else(|| {
                    AppError::Initialization(format!("Invalid DNS server address: {}", server))
                })?;
            group.merge(NameServerConfigGroup::from_ips_clear(
                &[addr.ip()],
                addr.port(),
                true,
            ));
        }
        tracing::debug!(target: "dns", "Using configured name servers: {:?}", config.dns_servers);
        (
            ResolverConfig::from_parts(None, vec![], group),
            ResolverOpts::default(),
        )
    };

    opts.timeout = config.dns_timeout;
    opts.attempts = 1;

    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

/// Network-backed existence check: an IPv4 forward lookup, then a general
/// address-info lookup through the host resolver. Each step is bounded by
/// the configured timeout.
pub struct NetworkResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl NetworkResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            resolver: create_resolver(config)?,
            timeout: config.dns_timeout,
        })
    }

    async fn forward_lookup(&self, domain: &str) -> bool {
        match timeout(self.timeout, self.resolver.ipv4_lookup(domain)).await {
            Ok(Ok(lookup)) => lookup.iter().next().is_some(),
            Ok(Err(e)) => {
                tracing::trace!(target: "dns", "A lookup for {} failed: {}", domain, e);
                false
            }
            Err(_) => {
                tracing::trace!(target: "dns", "A lookup for {} timed out after {:?}", domain, self.timeout);
                false
            }
        }
    }

    async fn address_info_lookup(&self, domain: &str) -> bool {
        match timeout(self.timeout, tokio::net::lookup_host((domain, 0u16))).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                tracing::trace!(target: "dns", "Address-info lookup for {} failed: {}", domain, e);
                false
            }
            Err(_) => {
                tracing::trace!(target: "dns", "Address-info lookup for {} timed out after {:?}", domain, self.timeout);
                false
            }
        }
    }
}

#[async_trait]
impl DomainResolver for NetworkResolver {
    async fn domain_exists(&self, domain: &str) -> Result<bool> {
        if self.forward_lookup(domain).await {
            tracing::debug!(target: "dns", "{} resolved via A lookup.", domain);
            return Ok(true);
        }
        let exists = self.address_info_lookup(domain).await;
        tracing::debug!(target: "dns", "{} address-info lookup: exists={}", domain, exists);
        Ok(exists)
    }
}

/// Answers from the allow-list first and defers unknown domains to `fallback`.
pub struct KnownDomainResolver<R> {
    known: Arc<KnownDomains>,
    fallback: R,
}

impl<R: DomainResolver> KnownDomainResolver<R> {
    pub fn new(known: Arc<KnownDomains>, fallback: R) -> Self {
        Self { known, fallback }
    }
}

#[async_trait]
impl<R: DomainResolver> DomainResolver for KnownDomainResolver<R> {
    async fn domain_exists(&self, domain: &str) -> Result<bool> {
        if self.known.contains(domain) {
            tracing::trace!(target: "dns", "{} is on the allow-list.", domain);
            return Ok(true);
        }
        self.fallback.domain_exists(domain).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every call and answers `false`.
    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DomainResolver for CountingResolver {
        async fn domain_exists(&self, _domain: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_known_domain_skips_fallback() {
        let fallback = Arc::new(CountingResolver::default());
        let resolver =
            KnownDomainResolver::new(Arc::new(KnownDomains::default()), Arc::clone(&fallback));

        assert!(resolver.domain_exists("gmail.com").await.unwrap());
        assert!(resolver.domain_exists("YAHOO.com").await.unwrap());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_domain_uses_fallback() {
        let fallback = Arc::new(CountingResolver::default());
        let resolver =
            KnownDomainResolver::new(Arc::new(KnownDomains::default()), Arc::clone(&fallback));

        assert!(!resolver
            .domain_exists("nonexistent-domain-xyz123.test")
            .await
            .unwrap());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_resolver_builds_with_explicit_servers() {
        let config = Config {
            dns_servers: vec!["127.0.0.1".into(), "[::1]:5353".into()],
            ..Config::default()
        };
        assert!(NetworkResolver::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_missing_within_bound() {
        let config = Config {
            dns_servers: vec!["127.0.0.1:9".into()],
            dns_timeout: Duration::from_millis(200),
            ..Config::default()
        };
        let resolver = NetworkResolver::new(&config).unwrap();

        let start = std::time::Instant::now();
        let exists = resolver
            .domain_exists("no-such-host.invalid")
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(!exists);
        // Two bounded steps plus scheduling slack.
        assert!(
            elapsed <= config.dns_timeout * 2 + Duration::from_millis(200),
            "took {:?}",
            elapsed
        );
    }
}
