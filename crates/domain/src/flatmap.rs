//! Legacy flat key/value rendering of resource state
//!
//! Sets are addressed by the hash code of each element
//! (`domains.<hash>`), counts live under `<attr>.#` and map sizes under
//! `<attr>.%`.

use std::collections::{BTreeMap, BTreeSet};

use crate::hashcode;
use crate::model::SubscriptionResource;

/// Flatten a resource state into legacy flat-map form
pub fn flatten(resource: &SubscriptionResource) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();

    let scalars = [
        ("id", resource.id.as_str()),
        ("certificate_authority", resource.certificate_authority.as_str()),
        ("certificate_id", resource.certificate_id.as_str()),
        ("common_name", resource.common_name.as_str()),
        ("configuration_id", resource.configuration_id.as_str()),
        ("created_at", resource.created_at.as_str()),
        ("state", resource.state.as_str()),
        ("updated_at", resource.updated_at.as_str()),
    ];
    for (key, value) in scalars {
        flat.insert(key.to_string(), value.to_string());
    }
    flat.insert(
        "force_destroy".to_string(),
        resource.force_destroy.to_string(),
    );
    flat.insert("force_update".to_string(), resource.force_update.to_string());

    insert_string_set(&mut flat, "domains", &resource.domains);

    flat.insert(
        "managed_dns_challenge.%".to_string(),
        resource.managed_dns_challenge.len().to_string(),
    );
    for (key, value) in &resource.managed_dns_challenge {
        flat.insert(format!("managed_dns_challenge.{key}"), value.clone());
    }

    flat.insert(
        "managed_dns_challenges.#".to_string(),
        resource.managed_dns_challenges.len().to_string(),
    );
    for challenge in &resource.managed_dns_challenges {
        let hash = hashcode::strings(&[
            &challenge.record_name,
            &challenge.record_type,
            &challenge.record_value,
        ]);
        let prefix = format!("managed_dns_challenges.{hash}");
        flat.insert(format!("{prefix}.record_name"), challenge.record_name.clone());
        flat.insert(format!("{prefix}.record_type"), challenge.record_type.clone());
        flat.insert(format!("{prefix}.record_value"), challenge.record_value.clone());
    }

    flat.insert(
        "managed_http_challenges.#".to_string(),
        resource.managed_http_challenges.len().to_string(),
    );
    for challenge in &resource.managed_http_challenges {
        let mut parts = vec![challenge.record_name.as_str(), challenge.record_type.as_str()];
        parts.extend(challenge.record_values.iter().map(String::as_str));
        let prefix = format!("managed_http_challenges.{}", hashcode::strings(&parts));

        flat.insert(format!("{prefix}.record_name"), challenge.record_name.clone());
        flat.insert(format!("{prefix}.record_type"), challenge.record_type.clone());
        insert_string_set(
            &mut flat,
            &format!("{prefix}.record_values"),
            &challenge.record_values,
        );
    }

    flat
}

fn insert_string_set(flat: &mut BTreeMap<String, String>, name: &str, values: &BTreeSet<String>) {
    flat.insert(format!("{name}.#"), values.len().to_string());
    for value in values {
        flat.insert(format!("{name}.{}", hashcode::string(value)), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ManagedDnsChallenge, ManagedHttpChallenge, SubscriptionState};

    fn sample_resource() -> SubscriptionResource {
        SubscriptionResource {
            id: "sub-1".to_string(),
            certificate_authority: "certainly".to_string(),
            certificate_id: String::new(),
            common_name: "example.com".to_string(),
            configuration_id: "conf-1".to_string(),
            created_at: String::new(),
            domains: ["example.com", "www.example.com"]
                .into_iter()
                .map(String::from)
                .collect(),
            force_destroy: true,
            force_update: false,
            managed_dns_challenge: BTreeMap::new(),
            managed_dns_challenges: BTreeSet::from([ManagedDnsChallenge {
                record_name: "_acme-challenge.example.com".to_string(),
                record_type: "CNAME".to_string(),
                record_value: "x.fastly-validations.com".to_string(),
            }]),
            managed_http_challenges: BTreeSet::from([ManagedHttpChallenge {
                record_name: "example.com".to_string(),
                record_type: "A".to_string(),
                record_values: BTreeSet::from([
                    "151.101.2.132".to_string(),
                    "151.101.66.132".to_string(),
                ]),
            }]),
            state: SubscriptionState::Pending,
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_domains_keyed_by_hash() {
        let flat = flatten(&sample_resource());

        assert_eq!(flat["domains.#"], "2");
        let key = format!("domains.{}", hashcode::string("www.example.com"));
        assert_eq!(flat[&key], "www.example.com");
    }

    #[test]
    fn test_nested_sets_flattened() {
        let flat = flatten(&sample_resource());

        assert_eq!(flat["managed_dns_challenges.#"], "1");
        assert_eq!(flat["managed_http_challenges.#"], "1");
        assert_eq!(
            flat.keys()
                .filter(|k| k.starts_with("managed_http_challenges.") && k.contains(".record_values."))
                .count(),
            3
        );
        assert_eq!(flat["managed_dns_challenge.%"], "0");
    }

    #[test]
    fn test_scalars_and_flags() {
        let flat = flatten(&sample_resource());

        assert_eq!(flat["state"], "pending");
        assert_eq!(flat["force_destroy"], "true");
        assert_eq!(flat["force_update"], "false");
    }

    #[test]
    fn test_flatten_is_deterministic() {
        assert_eq!(flatten(&sample_resource()), flatten(&sample_resource()));
    }
}
