//! In-memory TLS subscription API for testing and offline mode
//!
//! Opened with [`InMemoryTlsApi::open`], the store is mirrored to a JSON file
//! after every change so that separate CLI runs see the same subscriptions.

use async_trait::async_trait;
use fastly_tls_domain::{
    Activation, ApiError, Authorization, Challenge, CreateSubscriptionInput,
    DeleteSubscriptionInput, GetSubscriptionInput, ListDomainsInput, Subscription,
    SubscriptionState, TlsDomain, TlsSubscriptionApi, UpdateSubscriptionInput,
    MANAGED_DNS_CHALLENGE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

const DEFAULT_CONFIGURATION: &str = "default-tls-configuration";
const HTTP_CNAME_TARGET: &str = "j.sni.global.fastly.net";
const HTTP_A_TARGETS: [&str; 2] = ["151.101.2.132", "151.101.66.132"];

/// Serialized form of the store
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    subscriptions: HashMap<String, Subscription>,
    #[serde(default)]
    activations: HashMap<String, Vec<Activation>>,
}

/// In-memory implementation of the Fastly TLS subscription endpoints
pub struct InMemoryTlsApi {
    subscriptions: RwLock<HashMap<String, Subscription>>,
    /// Activations per domain, in creation order
    activations: RwLock<HashMap<String, Vec<Activation>>>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryTlsApi {
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default(), None)
    }

    /// Load the store from `path`, starting empty when the file does not
    /// exist yet. Every create, update and delete rewrites the file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ApiError::InvalidResponse(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(Self::io_error(&path, e)),
        };

        tracing::debug!(path = %path.display(), "Opened in-memory TLS store");
        Ok(Self::from_snapshot(snapshot, Some(path)))
    }

    fn from_snapshot(snapshot: Snapshot, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            subscriptions: RwLock::new(snapshot.subscriptions),
            activations: RwLock::new(snapshot.activations),
            snapshot_path,
        }
    }

    fn lock_error(e: impl std::fmt::Display) -> ApiError {
        ApiError::Network(format!("lock poisoned: {}", e))
    }

    fn io_error(path: &Path, e: std::io::Error) -> ApiError {
        ApiError::Network(format!("{}: {}", path.display(), e))
    }

    fn snapshot_json(&self) -> Result<String, ApiError> {
        let snapshot = Snapshot {
            subscriptions: self.subscriptions.read().map_err(Self::lock_error)?.clone(),
            activations: self.activations.read().map_err(Self::lock_error)?.clone(),
        };
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn persist(&self) -> Result<(), ApiError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let json = self.snapshot_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(parent, e))?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Self::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    fn authorizations(domains: &[String]) -> Vec<Authorization> {
        domains
            .iter()
            .map(|domain| Authorization {
                id: format!("auth-{}", domain),
                challenges: vec![
                    Challenge {
                        challenge_type: MANAGED_DNS_CHALLENGE.to_string(),
                        record_type: "CNAME".to_string(),
                        record_name: format!("_acme-challenge.{}", domain),
                        values: vec![format!(
                            "{}.fastly-validations.com",
                            domain.replace('.', "-")
                        )],
                    },
                    Challenge {
                        challenge_type: "managed-http-cname".to_string(),
                        record_type: "CNAME".to_string(),
                        record_name: domain.clone(),
                        values: vec![HTTP_CNAME_TARGET.to_string()],
                    },
                    Challenge {
                        challenge_type: "managed-http-a".to_string(),
                        record_type: "A".to_string(),
                        record_name: domain.clone(),
                        values: HTTP_A_TARGETS.iter().map(|v| v.to_string()).collect(),
                    },
                ],
            })
            .collect()
    }

    /// Move a subscription to `issued` and attach a certificate
    pub fn issue(&self, id: &str) -> Result<String, ApiError> {
        let mut subscriptions = self.subscriptions.write().map_err(Self::lock_error)?;
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("TLS subscription {}", id)))?;

        let certificate_id = format!("cert-{}", subscription.id);
        subscription.state = SubscriptionState::Issued;
        subscription.certificate_ids = vec![certificate_id.clone()];
        subscription.updated_at = Some(OffsetDateTime::now_utc());
        Ok(certificate_id)
    }

    /// Force a subscription into the given state
    pub fn set_state(&self, id: &str, state: SubscriptionState) -> Result<(), ApiError> {
        let mut subscriptions = self.subscriptions.write().map_err(Self::lock_error)?;
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("TLS subscription {}", id)))?;
        subscription.state = state;
        Ok(())
    }

    /// Record an activation of `domain` with `configuration_id`
    pub fn activate(&self, domain: &str, configuration_id: &str) -> Result<(), ApiError> {
        let mut activations = self.activations.write().map_err(Self::lock_error)?;
        activations
            .entry(domain.to_string())
            .or_default()
            .push(Activation {
                id: Uuid::new_v4().simple().to_string(),
                configuration_id: Some(configuration_id.to_string()),
                created_at: Some(OffsetDateTime::now_utc()),
            });
        Ok(())
    }

    fn has_activations(&self, domains: &[String]) -> Result<bool, ApiError> {
        let activations = self.activations.read().map_err(Self::lock_error)?;
        Ok(domains
            .iter()
            .any(|d| activations.get(d).is_some_and(|a| !a.is_empty())))
    }
}

impl Default for InMemoryTlsApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TlsSubscriptionApi for InMemoryTlsApi {
    async fn create_subscription(
        &self,
        input: CreateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let now = OffsetDateTime::now_utc();
        let common_name = input
            .common_name
            .clone()
            .or_else(|| input.domains.first().cloned());

        let subscription = Subscription {
            id: Uuid::new_v4().simple().to_string(),
            certificate_authority: input.certificate_authority.to_string(),
            state: SubscriptionState::Pending,
            common_name,
            authorizations: Self::authorizations(&input.domains),
            domains: input.domains,
            configuration_id: Some(
                input
                    .configuration_id
                    .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string()),
            ),
            certificate_ids: vec![],
            created_at: Some(now),
            updated_at: Some(now),
        };

        {
            let mut subscriptions = self.subscriptions.write().map_err(Self::lock_error)?;
            subscriptions.insert(subscription.id.clone(), subscription.clone());
        }
        self.persist().await?;
        Ok(subscription)
    }

    async fn get_subscription(
        &self,
        input: GetSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let subscriptions = self.subscriptions.read().map_err(Self::lock_error)?;
        let mut subscription = subscriptions
            .get(&input.id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("TLS subscription {}", input.id)))?;

        if input.include.as_deref() != Some("tls_authorizations") {
            subscription.authorizations.clear();
        }
        Ok(subscription)
    }

    async fn update_subscription(
        &self,
        input: UpdateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let active = self.has_activations(&input.domains)?;
        let updated = {
            let mut subscriptions = self.subscriptions.write().map_err(Self::lock_error)?;
            let subscription = subscriptions
                .get_mut(&input.id)
                .ok_or_else(|| ApiError::NotFound(format!("TLS subscription {}", input.id)))?;

            if !subscription.state.allows_update() {
                return Err(ApiError::Api {
                    status: 400,
                    message: format!(
                        "subscription in state {} cannot be updated",
                        subscription.state
                    ),
                });
            }
            if active && !input.force {
                return Err(ApiError::Api {
                    status: 409,
                    message: "subscription has active domains, use force to update".to_string(),
                });
            }

            subscription.authorizations = Self::authorizations(&input.domains);
            subscription.domains = input.domains;
            subscription.common_name = Some(input.common_name);
            if !input.configuration_id.is_empty() {
                subscription.configuration_id = Some(input.configuration_id);
            }
            subscription.updated_at = Some(OffsetDateTime::now_utc());
            subscription.clone()
        };

        self.persist().await?;
        Ok(updated)
    }

    async fn delete_subscription(&self, input: DeleteSubscriptionInput) -> Result<(), ApiError> {
        let domains = {
            let subscriptions = self.subscriptions.read().map_err(Self::lock_error)?;
            subscriptions
                .get(&input.id)
                .map(|s| s.domains.clone())
                .ok_or_else(|| ApiError::NotFound(format!("TLS subscription {}", input.id)))?
        };

        if !input.force && self.has_activations(&domains)? {
            return Err(ApiError::Api {
                status: 409,
                message: "subscription has active domains, use force to delete".to_string(),
            });
        }

        {
            let mut subscriptions = self.subscriptions.write().map_err(Self::lock_error)?;
            subscriptions.remove(&input.id);
        }
        self.persist().await
    }

    async fn list_domains(&self, input: ListDomainsInput) -> Result<Vec<TlsDomain>, ApiError> {
        let subscriptions = self.subscriptions.read().map_err(Self::lock_error)?;
        let activations = self.activations.read().map_err(Self::lock_error)?;

        let mut domains: Vec<TlsDomain> = subscriptions
            .values()
            .filter(|s| match &input.filter_certificate_id {
                Some(certificate_id) => s.certificate_ids.contains(certificate_id),
                None => true,
            })
            .flat_map(|s| s.domains.iter())
            .map(|domain| TlsDomain {
                id: domain.clone(),
                activations: if input.include.as_deref() == Some("tls_activations") {
                    activations.get(domain).cloned().unwrap_or_default()
                } else {
                    vec![]
                },
            })
            .collect();

        // Domains without activations sort last
        domains.sort_by_key(|d| {
            (
                d.activations.first().and_then(|a| a.created_at).is_none(),
                d.activations.first().and_then(|a| a.created_at),
                d.id.clone(),
            )
        });

        Ok(domains)
    }
}
