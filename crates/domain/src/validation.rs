//! Input validation for subscription configuration
//!
//! Let's Encrypt rejects uppercase letters in domain names, and the Fastly API
//! silently lowercases them. Accepting uppercase input would leave a
//! permanent diff between configuration and state, so it is refused up front.

use std::collections::BTreeSet;

/// Validation failures, raised before any remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("expected certificate_authority to be one of {valid:?}, got {value}")]
    CertificateAuthority { value: String, valid: Vec<String> },
    #[error("tls subscription 'domains' must contain at least one domain")]
    NoDomains,
    #[error("tls subscription 'domains' must not contain uppercase letters: {domains:?}")]
    UppercaseDomains { domains: Vec<String> },
    #[error("tls subscription 'common_name' must not contain uppercase letters: {0}")]
    UppercaseCommonName(String),
    #[error("domain specified as common_name ({common_name}) must also be in domains ({domains:?})")]
    CommonNameNotInDomains {
        common_name: String,
        domains: Vec<String>,
    },
}

impl ValidationError {
    /// Attribute the failure refers to
    pub fn attribute(&self) -> &'static str {
        match self {
            ValidationError::CertificateAuthority { .. } => "certificate_authority",
            ValidationError::NoDomains | ValidationError::UppercaseDomains { .. } => "domains",
            ValidationError::UppercaseCommonName(_)
            | ValidationError::CommonNameNotInDomains { .. } => "common_name",
        }
    }
}

fn has_uppercase(value: &str) -> bool {
    value != value.to_lowercase()
}

/// Reject an empty domain set or any domain containing uppercase letters
pub fn validate_domains(domains: &BTreeSet<String>) -> Result<(), ValidationError> {
    if domains.is_empty() {
        return Err(ValidationError::NoDomains);
    }
    if domains.iter().any(|d| has_uppercase(d)) {
        return Err(ValidationError::UppercaseDomains {
            domains: domains.iter().cloned().collect(),
        });
    }
    Ok(())
}

/// Reject a common name containing uppercase letters
pub fn validate_common_name(common_name: &str) -> Result<(), ValidationError> {
    if has_uppercase(common_name) {
        return Err(ValidationError::UppercaseCommonName(common_name.to_string()));
    }
    Ok(())
}

/// The common name must be one of the subscription's domains
pub fn validate_common_name_in_domains(
    common_name: &str,
    domains: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if !domains.contains(common_name) {
        return Err(ValidationError::CommonNameNotInDomains {
            common_name: common_name.to_string(),
            domains: domains.iter().cloned().collect(),
        });
    }
    Ok(())
}
