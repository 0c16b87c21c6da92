use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::ValidationOutcome;
use crate::utils::dns::{DomainResolver, KnownDomainResolver, NetworkResolver};
use crate::utils::domain::{domain_of, KnownDomains};
use crate::utils::syntax::check_syntax;

use std::sync::Arc;

/// Classifies single addresses: syntax first, then domain existence.
///
/// Cheap to share across tasks; the resolver is behind an `Arc`.
#[derive(Clone)]
pub struct EmailValidator {
    resolver: Arc<dyn DomainResolver>,
}

impl EmailValidator {
    /// Builds the allow-list and network resolver from `config`.
    pub(crate) async fn new(config: &Config) -> Result<Self> {
        tracing::debug!("Initializing EmailValidator components...");
        let known = Arc::new(KnownDomains::with_extra(&config.extra_known_domains));
        let network = NetworkResolver::new(config)?;
        tracing::debug!("DNS resolver initialized.");

        tracing::info!(
            "EmailValidator initialized ({} known domains, DNS timeout {:?}).",
            known.len(),
            config.dns_timeout
        );
        Ok(Self {
            resolver: Arc::new(KnownDomainResolver::new(known, network)),
        })
    }

    /// Uses `resolver` for every domain check.
    pub fn with_resolver(resolver: Arc<dyn DomainResolver>) -> Self {
        Self { resolver }
    }

    pub(crate) async fn check_email(&self, email: &str) -> ValidationOutcome {
        if let Err(violation) = check_syntax(email) {
            tracing::trace!(target: "validate_task", "<{}> rejected: {}", email, violation);
            return ValidationOutcome::invalid_syntax(email.to_string(), violation.to_string());
        }

        let Some(domain) = domain_of(email) else {
            return ValidationOutcome::error(
                email.to_string(),
                true,
                "Address has no domain part".to_string(),
            );
        };

        match self.resolver.domain_exists(domain).await {
            Ok(true) => ValidationOutcome::valid(email.to_string()),
            Ok(false) => {
                tracing::debug!(target: "validate_task", "<{}> domain {} does not resolve.", email, domain);
                ValidationOutcome::invalid_domain(email.to_string())
            }
            Err(e) => {
                tracing::error!(target: "validate_task", "<{}> domain check failed: {}", email, e);
                ValidationOutcome::error(email.to_string(), true, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::core::models::ValidationStatus;
    use async_trait::async_trait;

    struct OnlyResolves(&'static str);

    #[async_trait]
    impl DomainResolver for OnlyResolves {
        async fn domain_exists(&self, domain: &str) -> Result<bool> {
            if domain == "explode.test" {
                return Err(AppError::Internal("resolver fault".into()));
            }
            Ok(domain == self.0)
        }
    }

    fn validator() -> EmailValidator {
        EmailValidator::with_resolver(Arc::new(OnlyResolves("example.org")))
    }

    #[tokio::test]
    async fn test_classification() {
        let v = validator();

        let outcome = v.check_email("a@example.org").await;
        assert_eq!(outcome.status, ValidationStatus::Valid);
        assert!(outcome.syntax_valid && outcome.domain_exists);

        let outcome = v.check_email("bad-address").await;
        assert_eq!(outcome.status, ValidationStatus::InvalidSyntax);
        assert!(!outcome.syntax_valid);
        assert!(outcome.detail.is_some());

        let outcome = v.check_email("a@elsewhere.test").await;
        assert_eq!(outcome.status, ValidationStatus::InvalidDomain);
        assert!(outcome.syntax_valid && !outcome.domain_exists);

        let outcome = v.check_email("a@explode.test").await;
        assert_eq!(outcome.status, ValidationStatus::Error);
        assert_eq!(outcome.detail.as_deref(), Some("Internal error: resolver fault"));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let v = validator();
        for email in ["a@example.org", "x..y@example.org", "a@elsewhere.test"] {
            let first = v.check_email(email).await;
            let second = v.check_email(email).await;
            assert_eq!(first, second);
        }
    }
}
