//! Structural address checks. Pure and network-free.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_ADDRESS_LEN: usize = 254;
pub const MAX_LOCAL_PART_LEN: usize = 64;
pub const MAX_DOMAIN_LEN: usize = 253;

static ADDRESS_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._%+-]*@[a-zA-Z0-9][a-zA-Z0-9.-]*\.[a-zA-Z]{2,}$")
        .expect("address shape regex is valid")
});

/// The first rule an address broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxViolation {
    Empty,
    TooLong,
    LocalPartDotEdge,
    ConsecutiveDots,
    LocalPartTooLong,
    DomainTooLong,
    Shape,
}

impl std::fmt::Display for SyntaxViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyntaxViolation::Empty => "address is empty",
            SyntaxViolation::TooLong => "address exceeds 254 characters",
            SyntaxViolation::LocalPartDotEdge => "local part starts or ends with '.'",
            SyntaxViolation::ConsecutiveDots => "address contains '..'",
            SyntaxViolation::LocalPartTooLong => "local part exceeds 64 characters",
            SyntaxViolation::DomainTooLong => "domain exceeds 253 characters",
            SyntaxViolation::Shape => "address does not match local@domain.tld",
        };
        f.write_str(s)
    }
}

/// Checks every structural rule; `Ok(())` means the address is syntax-valid.
///
/// All rules must hold, so the order below only decides which violation is
/// reported, never whether the address passes.
pub fn check_syntax(email: &str) -> Result<(), SyntaxViolation> {
    if email.is_empty() {
        return Err(SyntaxViolation::Empty);
    }
    if email.chars().count() > MAX_ADDRESS_LEN {
        return Err(SyntaxViolation::TooLong);
    }

    if let Some((local, domain)) = email.rsplit_once('@') {
        if local.starts_with('.') || local.ends_with('.') {
            return Err(SyntaxViolation::LocalPartDotEdge);
        }
        if email.contains("..") {
            return Err(SyntaxViolation::ConsecutiveDots);
        }
        if local.chars().count() > MAX_LOCAL_PART_LEN {
            return Err(SyntaxViolation::LocalPartTooLong);
        }
        if domain.chars().count() > MAX_DOMAIN_LEN {
            return Err(SyntaxViolation::DomainTooLong);
        }
    } else if email.contains("..") {
        return Err(SyntaxViolation::ConsecutiveDots);
    }

    if !ADDRESS_SHAPE.is_match(email) {
        return Err(SyntaxViolation::Shape);
    }
    Ok(())
}

pub fn is_valid_syntax(email: &str) -> bool {
    check_syntax(email).is_ok()
}
