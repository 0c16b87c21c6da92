//! Helpers for the domain half of an address and the built-in allow-list.

use std::collections::HashSet;

/// Mailbox providers known to exist; lookups for these skip the network.
pub const COMMON_DOMAINS: [&str; 15] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "zoho.com",
    "protonmail.com",
    "yandex.com",
    "live.com",
    "msn.com",
    "inbox.com",
    "gmx.com",
    "fastmail.com",
];

/// Returns the part after the last `@`, or `None` if there is no `@` or the
/// domain part is empty.
pub(crate) fn domain_of(email: &str) -> Option<&str> {
    let (_, domain) = email.rsplit_once('@')?;
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Read-only set of domain names treated as existing without a lookup.
///
/// Built once at start-up and shared behind an `Arc`; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct KnownDomains {
    domains: HashSet<String>,
}

impl KnownDomains {
    /// The built-in list plus `extra` (lower-cased, blanks ignored).
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domains: HashSet<String> = COMMON_DOMAINS.iter().map(|d| d.to_string()).collect();
        for d in extra {
            let d = d.as_ref().trim().trim_end_matches('.').to_lowercase();
            if !d.is_empty() {
                domains.insert(d);
            }
        }
        tracing::debug!("Domain allow-list holds {} entries.", domains.len());
        Self { domains }
    }

    /// Case-insensitive membership test. A trailing root dot is ignored.
    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_end_matches('.');
        if domain.bytes().any(|b| b.is_ascii_uppercase()) {
            self.domains.contains(&domain.to_ascii_lowercase())
        } else {
            self.domains.contains(domain)
        }
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl Default for KnownDomains {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("a@gmail.com"), Some("gmail.com"));
        assert_eq!(domain_of("a@b@example.org"), Some("example.org"));
        assert_eq!(domain_of("no-at-sign"), None);
        assert_eq!(domain_of("trailing@"), None);
    }

    #[test]
    fn test_known_domains_case_insensitive() {
        let known = KnownDomains::default();
        assert_eq!(known.len(), COMMON_DOMAINS.len());
        assert!(known.contains("gmail.com"));
        assert!(known.contains("GMail.COM"));
        assert!(known.contains("outlook.com."));
        assert!(!known.contains("example.com"));
        assert!(!known.contains("mail.gmail.com"));
    }

    #[test]
    fn test_known_domains_extra() {
        let known = KnownDomains::with_extra(["Corp.Example", "  ", "partner.test."]);
        assert!(known.contains("corp.example"));
        assert!(known.contains("partner.test"));
        assert_eq!(known.len(), COMMON_DOMAINS.len() + 2);
    }
}
