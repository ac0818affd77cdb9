//! Mapping of remote subscription data back into resource state

use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::{
    Authorization, LocalSettings, ManagedDnsChallenge, ManagedHttpChallenge, Subscription,
    SubscriptionResource, TlsDomain,
};
use crate::usecases::lifecycle::ResourceError;

/// Challenges of a subscription, split by kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Challenges {
    pub dns: BTreeSet<ManagedDnsChallenge>,
    pub http: BTreeSet<ManagedHttpChallenge>,
}

/// Split every challenge of every authorization into DNS and HTTP records.
///
/// A DNS challenge keeps only its first value; one without any value is an error.
pub fn partition_challenges(authorizations: &[Authorization]) -> Result<Challenges, ResourceError> {
    let mut challenges = Challenges::default();

    for authorization in authorizations {
        for challenge in &authorization.challenges {
            if challenge.is_managed_dns() {
                let value = challenge.values.first().ok_or_else(|| {
                    ResourceError::MissingChallengeValues {
                        record_name: challenge.record_name.clone(),
                    }
                })?;
                challenges.dns.insert(ManagedDnsChallenge {
                    record_name: challenge.record_name.clone(),
                    record_type: challenge.record_type.clone(),
                    record_value: value.clone(),
                });
            } else {
                challenges.http.insert(ManagedHttpChallenge {
                    record_name: challenge.record_name.clone(),
                    record_type: challenge.record_type.clone(),
                    record_values: challenge.values.iter().cloned().collect(),
                });
            }
        }
    }

    Ok(challenges)
}

/// Build the deprecated single-challenge map.
///
/// Only the first authorization is consulted, so multi-SAN subscriptions lose
/// every other domain's challenge here. `managed_dns_challenges` is the
/// complete attribute; this one stays as-is for existing state.
pub fn legacy_dns_challenge(
    authorizations: &[Authorization],
) -> Result<BTreeMap<String, String>, ResourceError> {
    let mut legacy = BTreeMap::new();

    let Some(first) = authorizations.first() else {
        return Ok(legacy);
    };

    for challenge in first.challenges.iter().filter(|c| c.is_managed_dns()) {
        let value =
            challenge
                .values
                .first()
                .ok_or_else(|| ResourceError::MissingChallengeValues {
                    record_name: challenge.record_name.clone(),
                })?;
        legacy = BTreeMap::from([
            ("record_type".to_string(), challenge.record_type.clone()),
            ("record_name".to_string(), challenge.record_name.clone()),
            ("record_value".to_string(), value.clone()),
        ]);
    }

    Ok(legacy)
}

/// Pick the configuration actually serving the subscription's certificate.
///
/// A renewal can move the subscription to a new configuration without changing
/// its own reference. `domains` must be sorted by activation creation time
/// ascending; the first activation carrying a configuration wins.
pub fn resolve_configuration_id(subscription_configuration: &str, domains: &[TlsDomain]) -> String {
    domains
        .iter()
        .find_map(|domain| {
            domain
                .activations
                .first()
                .and_then(|activation| activation.configuration_id.clone())
        })
        .unwrap_or_else(|| subscription_configuration.to_string())
}

fn format_timestamp(ts: Option<OffsetDateTime>) -> Result<String, ResourceError> {
    match ts {
        Some(ts) => ts
            .format(&Rfc3339)
            .map_err(|e| ResourceError::Timestamp(e.to_string())),
        None => Ok(String::new()),
    }
}

/// Assemble the resource state from a fetched subscription
pub fn to_resource(
    subscription: &Subscription,
    configuration_id: String,
    local: LocalSettings,
) -> Result<SubscriptionResource, ResourceError> {
    let challenges = partition_challenges(&subscription.authorizations)?;
    let legacy = legacy_dns_challenge(&subscription.authorizations)?;

    Ok(SubscriptionResource {
        id: subscription.id.clone(),
        certificate_authority: subscription.certificate_authority.clone(),
        certificate_id: certificate_id(subscription),
        common_name: subscription.common_name.clone().unwrap_or_default(),
        configuration_id,
        created_at: format_timestamp(subscription.created_at)?,
        domains: subscription.domains.iter().cloned().collect(),
        force_destroy: local.force_destroy,
        force_update: local.force_update,
        managed_dns_challenge: legacy,
        managed_dns_challenges: challenges.dns,
        managed_http_challenges: challenges.http,
        state: subscription.state,
        updated_at: format_timestamp(subscription.updated_at)?,
    })
}

/// A subscription carries at most one certificate
pub fn certificate_id(subscription: &Subscription) -> String {
    subscription
        .certificate_ids
        .first()
        .cloned()
        .unwrap_or_default()
}
