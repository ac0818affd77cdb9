//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::validation::ValidationError;

/// Challenge type reported for DNS-based domain ownership challenges
pub const MANAGED_DNS_CHALLENGE: &str = "managed-dns";

/// Entity that issues and certifies the certificates of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CertificateAuthority {
    LetsEncrypt,
    Globalsign,
    Certainly,
}

impl CertificateAuthority {
    pub const ALL: [CertificateAuthority; 3] = [
        CertificateAuthority::LetsEncrypt,
        CertificateAuthority::Globalsign,
        CertificateAuthority::Certainly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateAuthority::LetsEncrypt => "lets-encrypt",
            CertificateAuthority::Globalsign => "globalsign",
            CertificateAuthority::Certainly => "certainly",
        }
    }
}

impl fmt::Display for CertificateAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateAuthority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ca| ca.as_str() == s)
            .ok_or_else(|| ValidationError::CertificateAuthority {
                value: s.to_string(),
                valid: Self::ALL.iter().map(|ca| ca.as_str().to_string()).collect(),
            })
    }
}

impl TryFrom<String> for CertificateAuthority {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CertificateAuthority> for String {
    fn from(ca: CertificateAuthority) -> Self {
        ca.as_str().to_string()
    }
}

/// Lifecycle state of a remote subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Pending,
    Processing,
    Issued,
    Renewing,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Pending => "pending",
            SubscriptionState::Processing => "processing",
            SubscriptionState::Issued => "issued",
            SubscriptionState::Renewing => "renewing",
            SubscriptionState::Unknown => "unknown",
        }
    }

    /// The API only accepts in-place updates while issued or pending
    pub fn allows_update(&self) -> bool {
        matches!(self, SubscriptionState::Issued | SubscriptionState::Pending)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A TLS subscription as returned by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub certificate_authority: String,
    pub state: SubscriptionState,
    pub common_name: Option<String>,
    pub domains: Vec<String>,
    pub configuration_id: Option<String>,
    /// "pending" and "processing" subscriptions may not carry a certificate yet
    pub certificate_ids: Vec<String>,
    pub authorizations: Vec<Authorization>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Domain ownership authorization attached to a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    pub id: String,
    pub challenges: Vec<Challenge>,
}

/// A DNS or HTTP record the domain owner must publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// `managed-dns`, `managed-http-cname`, `managed-http-a`, ...
    pub challenge_type: String,
    pub record_type: String,
    pub record_name: String,
    pub values: Vec<String>,
}

impl Challenge {
    pub fn is_managed_dns(&self) -> bool {
        self.challenge_type == MANAGED_DNS_CHALLENGE
    }
}

/// A TLS domain from the domain listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsDomain {
    pub id: String,
    pub activations: Vec<Activation>,
}

/// Association between a domain and a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub id: String,
    pub configuration_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Input for creating a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriptionInput {
    pub certificate_authority: CertificateAuthority,
    pub domains: Vec<String>,
    pub common_name: Option<String>,
    pub configuration_id: Option<String>,
}

/// Input for fetching a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct GetSubscriptionInput {
    pub id: String,
    /// Related resources to side-load, e.g. `tls_authorizations`
    pub include: Option<String>,
}

/// Input for updating a subscription. The API needs all three of domains,
/// common name and configuration on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSubscriptionInput {
    pub id: String,
    pub force: bool,
    pub domains: Vec<String>,
    pub common_name: String,
    pub configuration_id: String,
}

/// Input for deleting a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSubscriptionInput {
    pub id: String,
    pub force: bool,
}

/// Input for listing TLS domains
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListDomainsInput {
    pub filter_certificate_id: Option<String>,
    pub include: Option<String>,
    pub sort: Option<String>,
}

/// Declarative configuration of a subscription resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub certificate_authority: CertificateAuthority,
    pub domains: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
    #[serde(default)]
    pub force_destroy: bool,
    #[serde(default)]
    pub force_update: bool,
}

/// Fields that only exist in the local representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalSettings {
    pub force_destroy: bool,
    pub force_update: bool,
}

impl From<&SubscriptionConfig> for LocalSettings {
    fn from(config: &SubscriptionConfig) -> Self {
        Self {
            force_destroy: config.force_destroy,
            force_update: config.force_update,
        }
    }
}

impl From<&SubscriptionResource> for LocalSettings {
    fn from(resource: &SubscriptionResource) -> Self {
        Self {
            force_destroy: resource.force_destroy,
            force_update: resource.force_update,
        }
    }
}

/// DNS record answering an ACME DNS challenge
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagedDnsChallenge {
    pub record_name: String,
    pub record_type: String,
    pub record_value: String,
}

/// Record answering an ACME HTTP challenge
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagedHttpChallenge {
    pub record_name: String,
    pub record_type: String,
    pub record_values: BTreeSet<String>,
}

/// Persisted state of a subscription resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResource {
    pub id: String,
    pub certificate_authority: String,
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub configuration_id: String,
    #[serde(default)]
    pub created_at: String,
    pub domains: BTreeSet<String>,
    #[serde(default)]
    pub force_destroy: bool,
    #[serde(default)]
    pub force_update: bool,
    /// Deprecated: only covers the first authorization
    #[serde(default)]
    pub managed_dns_challenge: BTreeMap<String, String>,
    #[serde(default)]
    pub managed_dns_challenges: BTreeSet<ManagedDnsChallenge>,
    #[serde(default)]
    pub managed_http_challenges: BTreeSet<ManagedHttpChallenge>,
    #[serde(default)]
    pub state: SubscriptionState,
    #[serde(default)]
    pub updated_at: String,
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A message reported back to the caller of a resource operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Result of a read-backed resource operation
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// `None` when the subscription no longer exists remotely
    pub resource: Option<SubscriptionResource>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadOutcome {
    pub fn found(resource: SubscriptionResource) -> Self {
        Self {
            resource: Some(resource),
            diagnostics: vec![],
        }
    }

    pub fn gone(diagnostic: Diagnostic) -> Self {
        Self {
            resource: None,
            diagnostics: vec![diagnostic],
        }
    }
}
