//! JSON:API documents exchanged with the Fastly TLS endpoints

use fastly_tls_domain::{
    Activation, ApiError, Authorization, Challenge, Subscription, SubscriptionState, TlsDomain,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub(crate) const TYPE_SUBSCRIPTION: &str = "tls_subscription";
pub(crate) const TYPE_DOMAIN: &str = "tls_domain";
pub(crate) const TYPE_CONFIGURATION: &str = "tls_configuration";
const TYPE_AUTHORIZATION: &str = "tls_authorization";
const TYPE_ACTIVATION: &str = "tls_activation";

/// Top-level response document
#[derive(Debug, Deserialize)]
pub(crate) struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub included: Vec<ResourceObject<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceObject<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Option<A>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl<A> ResourceObject<A> {
    fn related_ids(&self, name: &str) -> Vec<String> {
        match self.relationships.get(name).and_then(|r| r.data.as_ref()) {
            Some(Linkage::One(identifier)) => vec![identifier.id.clone()],
            Some(Linkage::Many(identifiers)) => identifiers.iter().map(|i| i.id.clone()).collect(),
            None => vec![],
        }
    }

    fn related_id(&self, name: &str) -> Option<String> {
        self.related_ids(name).into_iter().next()
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum Linkage {
    One(Identifier),
    Many(Vec<Identifier>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct Identifier {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Identifier {
    pub fn new(kind: &str, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.to_string(),
        }
    }
}

impl Relationship {
    pub fn one(kind: &str, id: impl Into<String>) -> Self {
        Self {
            data: Some(Linkage::One(Identifier::new(kind, id))),
        }
    }

    pub fn many(kind: &str, ids: &[String]) -> Self {
        Self {
            data: Some(Linkage::Many(
                ids.iter().map(|id| Identifier::new(kind, id.clone())).collect(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionAttributes {
    #[serde(default)]
    pub certificate_authority: String,
    #[serde(default)]
    pub state: SubscriptionState,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationAttributes {
    #[serde(default)]
    challenges: Vec<ChallengeAttributes>,
}

#[derive(Debug, Deserialize)]
struct ChallengeAttributes {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record_type: String,
    #[serde(default)]
    record_name: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ActivationAttributes {
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

/// Request body for create and update
#[derive(Debug, Serialize)]
pub(crate) struct WriteDocument {
    pub data: WriteResource,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<WriteAttributes>,
    pub relationships: BTreeMap<&'static str, Relationship>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteAttributes {
    pub certificate_authority: String,
}

fn included_attributes<A: DeserializeOwned>(
    object: &ResourceObject<serde_json::Value>,
) -> Result<Option<A>, ApiError> {
    object
        .attributes
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ApiError::InvalidResponse(format!("{} {}: {}", object.kind, object.id, e)))
}

/// Resolve a subscription document, joining side-loaded authorizations
pub(crate) fn subscription_from_document(
    document: Document<ResourceObject<SubscriptionAttributes>>,
) -> Result<Subscription, ApiError> {
    let data = document.data;

    let mut authorizations = Vec::new();
    for id in data.related_ids("tls_authorizations") {
        let Some(object) = document
            .included
            .iter()
            .find(|o| o.kind == TYPE_AUTHORIZATION && o.id == id)
        else {
            continue;
        };
        let challenges = included_attributes::<AuthorizationAttributes>(object)?
            .map(|a| a.challenges)
            .unwrap_or_default()
            .into_iter()
            .map(|c| Challenge {
                challenge_type: c.kind,
                record_type: c.record_type,
                record_name: c.record_name,
                values: c.values,
            })
            .collect();
        authorizations.push(Authorization { id, challenges });
    }

    let domains = data.related_ids("tls_domains");
    let common_name = data.related_id("common_name");
    let configuration_id = data.related_id("tls_configuration");
    let certificate_ids = data.related_ids("tls_certificates");

    let attributes = data.attributes.ok_or_else(|| {
        ApiError::InvalidResponse(format!("subscription {} has no attributes", data.id))
    })?;

    Ok(Subscription {
        id: data.id,
        certificate_authority: attributes.certificate_authority,
        state: attributes.state,
        common_name,
        domains,
        configuration_id,
        certificate_ids,
        authorizations,
        created_at: attributes.created_at,
        updated_at: attributes.updated_at,
    })
}

/// Resolve a domain listing, joining side-loaded activations in the order
/// each domain references them
pub(crate) fn domains_from_document(
    document: Document<Vec<ResourceObject<serde_json::Value>>>,
) -> Result<Vec<TlsDomain>, ApiError> {
    let mut domains = Vec::with_capacity(document.data.len());

    for domain in &document.data {
        if domain.kind != TYPE_DOMAIN {
            continue;
        }

        let mut activations = Vec::new();
        for id in domain.related_ids("tls_activations") {
            let included = document
                .included
                .iter()
                .find(|o| o.kind == TYPE_ACTIVATION && o.id == id);

            let (configuration_id, created_at) = match included {
                Some(object) => (
                    object.related_id("tls_configuration"),
                    included_attributes::<ActivationAttributes>(object)?
                        .and_then(|a| a.created_at),
                ),
                None => (None, None),
            };

            activations.push(Activation {
                id,
                configuration_id,
                created_at,
            });
        }

        domains.push(TlsDomain {
            id: domain.id.clone(),
            activations,
        });
    }

    Ok(domains)
}

/// Extract a readable message from a JSON:API error body
pub(crate) fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<ErrorObject>,
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    }

    #[derive(Deserialize)]
    struct ErrorObject {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .filter_map(|e| match (e.title, e.detail) {
                (Some(t), Some(d)) => Some(format!("{t}: {d}")),
                (t, d) => t.or(d),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Ok(ErrorBody {
            msg: Some(msg),
            detail,
            ..
        }) => match detail {
            Some(detail) => format!("{msg}: {detail}"),
            None => msg,
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_document_joins_authorizations() {
        let document: Document<ResourceObject<SubscriptionAttributes>> =
            serde_json::from_value(serde_json::json!({
                "data": {
                    "id": "sub-1",
                    "type": "tls_subscription",
                    "attributes": {
                        "certificate_authority": "lets-encrypt",
                        "state": "processing",
                        "created_at": "2024-01-15T12:00:00Z",
                        "updated_at": null
                    },
                    "relationships": {
                        "tls_authorizations": {"data": [{"id": "auth-1", "type": "tls_authorization"}]},
                        "tls_certificates": {"data": []},
                        "tls_configuration": {"data": {"id": "conf-1", "type": "tls_configuration"}},
                        "tls_domains": {"data": [{"id": "example.com", "type": "tls_domain"}]},
                        "common_name": {"data": {"id": "example.com", "type": "tls_domain"}}
                    }
                },
                "included": [{
                    "id": "auth-1",
                    "type": "tls_authorization",
                    "attributes": {
                        "challenges": [{
                            "type": "managed-dns",
                            "record_type": "CNAME",
                            "record_name": "_acme-challenge.example.com",
                            "values": ["abc.fastly-validations.com"]
                        }]
                    }
                }]
            }))
            .unwrap();

        let subscription = subscription_from_document(document).unwrap();

        assert_eq!(subscription.state, SubscriptionState::Processing);
        assert_eq!(subscription.configuration_id.as_deref(), Some("conf-1"));
        assert_eq!(subscription.common_name.as_deref(), Some("example.com"));
        assert!(subscription.certificate_ids.is_empty());
        assert_eq!(subscription.authorizations[0].challenges.len(), 1);
        assert!(subscription.created_at.is_some());
        assert!(subscription.updated_at.is_none());
    }

    #[test]
    fn test_missing_attributes_are_none() {
        let document: Document<ResourceObject<SubscriptionAttributes>> =
            serde_json::from_value(serde_json::json!({
                "data": {"id": "sub-1", "type": "tls_subscription"}
            }))
            .unwrap();
        assert!(document.data.attributes.is_none());

        let err = subscription_from_document(document).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_error_message_prefers_errors_array() {
        let body = r#"{"errors":[{"title":"Bad request","detail":"Domain already taken"}]}"#;
        assert_eq!(error_message(body), "Bad request: Domain already taken");

        let legacy = r#"{"msg":"Record not found","detail":"Cannot find subscription"}"#;
        assert_eq!(error_message(legacy), "Record not found: Cannot find subscription");

        assert_eq!(error_message("plain text"), "plain text");
    }
}
