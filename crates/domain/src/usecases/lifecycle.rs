//! Subscription lifecycle use case - create, read, update, delete, import

use thiserror::Error;

use crate::{
    model::{
        CreateSubscriptionInput, DeleteSubscriptionInput, Diagnostic, GetSubscriptionInput,
        ListDomainsInput, LocalSettings, ReadOutcome, Subscription, SubscriptionConfig,
        SubscriptionResource, UpdateSubscriptionInput,
    },
    ports::{ApiError, TlsSubscriptionApi},
    usecases::{
        plan::{Plan, PlanAction},
        reconcile,
    },
    validation::{ValidationError, validate_common_name_in_domains},
};

const INCLUDE_AUTHORIZATIONS: &str = "tls_authorizations";
const INCLUDE_ACTIVATIONS: &str = "tls_activations";
const SORT_BY_ACTIVATION_CREATED: &str = "tls_activations.created_at";

/// Errors from resource operations
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("fastly API returned no record values for Managed DNS Challenge {record_name}")]
    MissingChallengeValues { record_name: String },
    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
}

impl ResourceError {
    /// Render as an error diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self {
            ResourceError::Validation(e) => diagnostic.with_attribute(e.attribute()),
            ResourceError::MissingChallengeValues { .. } => {
                diagnostic.with_attribute("managed_dns_challenges")
            }
            _ => diagnostic,
        }
    }
}

/// Handler for the TLS subscription resource.
///
/// Holds the API client explicitly; every operation goes through it.
pub struct SubscriptionHandler<A> {
    api: A,
}

impl<A: TlsSubscriptionApi> SubscriptionHandler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Create the subscription, then read it back to fill computed fields
    pub async fn create(&self, config: &SubscriptionConfig) -> Result<ReadOutcome, ResourceError> {
        if let Some(common_name) = &config.common_name {
            validate_common_name_in_domains(common_name, &config.domains)?;
        }

        let subscription = self
            .api
            .create_subscription(CreateSubscriptionInput {
                certificate_authority: config.certificate_authority,
                domains: config.domains.iter().cloned().collect(),
                common_name: config.common_name.clone(),
                configuration_id: config.configuration_id.clone(),
            })
            .await?;

        tracing::info!(
            id = %subscription.id,
            certificate_authority = %config.certificate_authority,
            domains = config.domains.len(),
            "Created TLS subscription"
        );

        self.read(&subscription.id, LocalSettings::from(config))
            .await
    }

    /// Refresh state from the API.
    ///
    /// A subscription deleted outside of this tool yields no resource and a
    /// warning rather than an error.
    pub async fn read(&self, id: &str, local: LocalSettings) -> Result<ReadOutcome, ResourceError> {
        tracing::debug!(id = %id, "Refreshing TLS subscription");

        let result = self
            .api
            .get_subscription(GetSubscriptionInput {
                id: id.to_string(),
                include: Some(INCLUDE_AUTHORIZATIONS.to_string()),
            })
            .await;

        let subscription = match result {
            Ok(subscription) => subscription,
            Err(e) if e.is_not_found() => {
                tracing::warn!(id = %id, "TLS subscription not found, removing from state");
                return Ok(ReadOutcome::gone(
                    Diagnostic::warning(format!(
                        "TLS subscription ({id}) not found - removing from state"
                    ))
                    .with_attribute(id),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let configuration_id = self.active_configuration_id(&subscription).await?;
        let resource = reconcile::to_resource(&subscription, configuration_id, local)?;

        Ok(ReadOutcome::found(resource))
    }

    /// Configuration serving the subscription's certificate, which differs
    /// from the subscription's own reference after a renewal
    async fn active_configuration_id(
        &self,
        subscription: &Subscription,
    ) -> Result<String, ResourceError> {
        let own = subscription.configuration_id.clone().unwrap_or_default();

        let certificate_id = reconcile::certificate_id(subscription);
        if certificate_id.is_empty() {
            return Ok(own);
        }

        let domains = self
            .api
            .list_domains(ListDomainsInput {
                filter_certificate_id: Some(certificate_id),
                include: Some(INCLUDE_ACTIVATIONS.to_string()),
                sort: Some(SORT_BY_ACTIVATION_CREATED.to_string()),
            })
            .await?;

        let resolved = reconcile::resolve_configuration_id(&own, &domains);
        if resolved != own {
            tracing::info!(
                id = %subscription.id,
                subscription_configuration = %own,
                active_configuration = %resolved,
                "Using configuration of latest activation"
            );
        }

        Ok(resolved)
    }

    /// Push domain or common name changes, then read back.
    ///
    /// Other attribute changes (the local force flags) never reach the API.
    pub async fn update(
        &self,
        prior: &SubscriptionResource,
        config: &SubscriptionConfig,
    ) -> Result<ReadOutcome, ResourceError> {
        let common_name = config
            .common_name
            .clone()
            .unwrap_or_else(|| prior.common_name.clone());

        if config.domains != prior.domains || common_name != prior.common_name {
            let configuration_id = config
                .configuration_id
                .clone()
                .unwrap_or_else(|| prior.configuration_id.clone());

            self.api
                .update_subscription(UpdateSubscriptionInput {
                    id: prior.id.clone(),
                    force: config.force_update,
                    domains: config.domains.iter().cloned().collect(),
                    common_name,
                    configuration_id,
                })
                .await?;

            tracing::info!(id = %prior.id, force = config.force_update, "Updated TLS subscription");
        } else {
            tracing::debug!(id = %prior.id, "No domain or common name change, skipping API update");
        }

        self.read(&prior.id, LocalSettings::from(config)).await
    }

    pub async fn delete(&self, resource: &SubscriptionResource) -> Result<(), ResourceError> {
        self.api
            .delete_subscription(DeleteSubscriptionInput {
                id: resource.id.clone(),
                force: resource.force_destroy,
            })
            .await?;

        tracing::info!(id = %resource.id, force = resource.force_destroy, "Deleted TLS subscription");
        Ok(())
    }

    /// Import an existing subscription by ID
    pub async fn import(&self, id: &str) -> Result<ReadOutcome, ResourceError> {
        self.read(id, LocalSettings::default()).await
    }

    /// Carry out a plan
    pub async fn apply(
        &self,
        plan: &Plan,
        prior: Option<&SubscriptionResource>,
        config: &SubscriptionConfig,
    ) -> Result<ReadOutcome, ResourceError> {
        match (plan.action, prior) {
            (PlanAction::Create, _) | (_, None) => self.create(config).await,
            (PlanAction::Replace, Some(prior)) => {
                self.delete(prior).await?;
                self.create(config).await
            }
            (PlanAction::Update, Some(prior)) => self.update(prior, config).await,
            (PlanAction::NoOp, Some(prior)) => self.read(&prior.id, LocalSettings::from(config)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Activation, Authorization, CertificateAuthority, Challenge, Severity, SubscriptionState,
        TlsDomain,
    };
    use crate::schema::ResourceSchema;
    use crate::usecases::plan::plan;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(CreateSubscriptionInput),
        Get(GetSubscriptionInput),
        Update(UpdateSubscriptionInput),
        Delete(DeleteSubscriptionInput),
        ListDomains(ListDomainsInput),
    }

    struct FakeApi {
        subscription: Option<Subscription>,
        domains: Vec<TlsDomain>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeApi {
        fn new(subscription: Option<Subscription>) -> Self {
            Self {
                subscription,
                domains: vec![],
                calls: Mutex::new(vec![]),
            }
        }

        fn with_domains(mut self, domains: Vec<TlsDomain>) -> Self {
            self.domains = domains;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn current(&self) -> Result<Subscription, ApiError> {
            self.subscription
                .clone()
                .ok_or_else(|| ApiError::NotFound("subscription".to_string()))
        }
    }

    #[async_trait]
    impl TlsSubscriptionApi for FakeApi {
        async fn create_subscription(
            &self,
            input: CreateSubscriptionInput,
        ) -> Result<Subscription, ApiError> {
            self.record(Call::Create(input));
            self.current()
        }

        async fn get_subscription(
            &self,
            input: GetSubscriptionInput,
        ) -> Result<Subscription, ApiError> {
            self.record(Call::Get(input));
            self.current()
        }

        async fn update_subscription(
            &self,
            input: UpdateSubscriptionInput,
        ) -> Result<Subscription, ApiError> {
            self.record(Call::Update(input));
            self.current()
        }

        async fn delete_subscription(
            &self,
            input: DeleteSubscriptionInput,
        ) -> Result<(), ApiError> {
            self.record(Call::Delete(input));
            Ok(())
        }

        async fn list_domains(&self, input: ListDomainsInput) -> Result<Vec<TlsDomain>, ApiError> {
            self.record(Call::ListDomains(input));
            Ok(self.domains.clone())
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_subscription() -> Subscription {
        Subscription {
            id: "sub-1".to_string(),
            certificate_authority: "lets-encrypt".to_string(),
            state: SubscriptionState::Issued,
            common_name: Some("example.com".to_string()),
            domains: vec!["example.com".to_string(), "www.example.com".to_string()],
            configuration_id: Some("conf-own".to_string()),
            certificate_ids: vec!["cert-1".to_string()],
            authorizations: vec![Authorization {
                id: "auth-1".to_string(),
                challenges: vec![Challenge {
                    challenge_type: "managed-dns".to_string(),
                    record_type: "CNAME".to_string(),
                    record_name: "_acme-challenge.example.com".to_string(),
                    values: vec!["abc.fastly-validations.com".to_string()],
                }],
            }],
            created_at: None,
            updated_at: None,
        }
    }

    fn sample_config() -> SubscriptionConfig {
        SubscriptionConfig {
            certificate_authority: CertificateAuthority::LetsEncrypt,
            domains: set(&["example.com", "www.example.com"]),
            common_name: None,
            configuration_id: None,
            force_destroy: false,
            force_update: false,
        }
    }

    fn is_mutation(call: &Call) -> bool {
        matches!(call, Call::Create(_) | Call::Update(_) | Call::Delete(_))
    }

    #[tokio::test]
    async fn test_create_then_reads_back() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);

        let outcome = handler.create(&sample_config()).await.unwrap();

        let resource = outcome.resource.unwrap();
        assert_eq!(resource.id, "sub-1");
        assert_eq!(resource.managed_dns_challenges.len(), 1);

        let calls = api.calls();
        assert!(matches!(calls[0], Call::Create(_)));
        assert!(matches!(
            &calls[1],
            Call::Get(GetSubscriptionInput { include: Some(inc), .. }) if inc == "tls_authorizations"
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_common_name_outside_domains() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let mut config = sample_config();
        config.common_name = Some("api.example.com".to_string());

        let result = handler.create(&config).await;

        assert!(matches!(
            result,
            Err(ResourceError::Validation(
                ValidationError::CommonNameNotInDomains { .. }
            ))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_subscription_warns() {
        let api = FakeApi::new(None);
        let handler = SubscriptionHandler::new(&api);

        let outcome = handler.read("sub-gone", LocalSettings::default()).await.unwrap();

        assert!(outcome.resource.is_none());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].severity, Severity::Warning);
        assert!(outcome.diagnostics[0].summary.contains("sub-gone"));
    }

    #[tokio::test]
    async fn test_import_reads_with_default_flags() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);

        let resource = handler.import("sub-1").await.unwrap().resource.unwrap();

        assert_eq!(resource.id, "sub-1");
        assert!(!resource.force_destroy);
        assert!(!resource.force_update);
        assert!(!api.calls().iter().any(is_mutation));
    }

    #[tokio::test]
    async fn test_read_keeps_own_configuration_without_activations() {
        let api = FakeApi::new(Some(sample_subscription())).with_domains(vec![TlsDomain {
            id: "example.com".to_string(),
            activations: vec![],
        }]);
        let handler = SubscriptionHandler::new(&api);

        let outcome = handler.read("sub-1", LocalSettings::default()).await.unwrap();

        assert_eq!(outcome.resource.unwrap().configuration_id, "conf-own");
        assert!(api.calls().iter().any(|c| matches!(
            c,
            Call::ListDomains(ListDomainsInput {
                filter_certificate_id: Some(cert),
                ..
            }) if cert == "cert-1"
        )));
    }

    #[tokio::test]
    async fn test_read_follows_activation_configuration() {
        let api = FakeApi::new(Some(sample_subscription())).with_domains(vec![TlsDomain {
            id: "example.com".to_string(),
            activations: vec![Activation {
                id: "act-1".to_string(),
                configuration_id: Some("conf-renewed".to_string()),
                created_at: None,
            }],
        }]);
        let handler = SubscriptionHandler::new(&api);

        let outcome = handler.read("sub-1", LocalSettings::default()).await.unwrap();

        assert_eq!(outcome.resource.unwrap().configuration_id, "conf-renewed");
    }

    #[tokio::test]
    async fn test_read_skips_domain_lookup_without_certificate() {
        let mut subscription = sample_subscription();
        subscription.state = SubscriptionState::Pending;
        subscription.certificate_ids.clear();
        let api = FakeApi::new(Some(subscription));
        let handler = SubscriptionHandler::new(&api);

        let outcome = handler.read("sub-1", LocalSettings::default()).await.unwrap();

        let resource = outcome.resource.unwrap();
        assert_eq!(resource.certificate_id, "");
        assert_eq!(resource.configuration_id, "conf-own");
        assert!(!api.calls().iter().any(|c| matches!(c, Call::ListDomains(_))));
    }

    #[tokio::test]
    async fn test_update_without_relevant_change_only_reads() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let prior = handler
            .read("sub-1", LocalSettings::default())
            .await
            .unwrap()
            .resource
            .unwrap();

        let mut config = sample_config();
        config.force_update = true;
        let outcome = handler.update(&prior, &config).await.unwrap();

        assert!(outcome.resource.unwrap().force_update);
        assert!(!api.calls().iter().any(is_mutation));
    }

    #[tokio::test]
    async fn test_update_sends_domains_common_name_and_configuration() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let prior = handler
            .read("sub-1", LocalSettings::default())
            .await
            .unwrap()
            .resource
            .unwrap();

        let mut config = sample_config();
        config.domains.insert("api.example.com".to_string());
        config.force_update = true;
        handler.update(&prior, &config).await.unwrap();

        let update = api
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::Update(input) => Some(input),
                _ => None,
            })
            .unwrap();
        assert_eq!(update.id, "sub-1");
        assert!(update.force);
        assert_eq!(update.domains.len(), 3);
        assert_eq!(update.common_name, "example.com");
        assert_eq!(update.configuration_id, "conf-own");
    }

    #[tokio::test]
    async fn test_update_on_common_name_change_only() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let prior = handler
            .read("sub-1", LocalSettings::default())
            .await
            .unwrap()
            .resource
            .unwrap();

        let mut config = sample_config();
        config.common_name = Some("www.example.com".to_string());
        handler.update(&prior, &config).await.unwrap();

        let updates: Vec<UpdateSubscriptionInput> = api
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(input) => Some(input),
                _ => None,
            })
            .collect();
        assert_eq!(
            updates,
            vec![UpdateSubscriptionInput {
                id: "sub-1".to_string(),
                force: false,
                domains: vec!["example.com".to_string(), "www.example.com".to_string()],
                common_name: "www.example.com".to_string(),
                configuration_id: "conf-own".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_update_omitted_common_name_keeps_prior() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let prior = handler
            .read("sub-1", LocalSettings::default())
            .await
            .unwrap()
            .resource
            .unwrap();
        assert_eq!(prior.common_name, "example.com");

        let mut config = sample_config();
        config.common_name = None;
        config.configuration_id = Some("conf-new".to_string());
        let outcome = handler.update(&prior, &config).await.unwrap();

        assert!(!api.calls().iter().any(is_mutation));
        assert_eq!(outcome.resource.unwrap().common_name, "example.com");
    }

    #[tokio::test]
    async fn test_delete_passes_force_flag() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let mut resource = handler
            .read("sub-1", LocalSettings::default())
            .await
            .unwrap()
            .resource
            .unwrap();
        resource.force_destroy = true;

        handler.delete(&resource).await.unwrap();

        assert!(api.calls().contains(&Call::Delete(DeleteSubscriptionInput {
            id: "sub-1".to_string(),
            force: true,
        })));
    }

    #[tokio::test]
    async fn test_apply_replace_deletes_then_creates() {
        let api = FakeApi::new(Some(sample_subscription()));
        let handler = SubscriptionHandler::new(&api);
        let mut prior = handler
            .import("sub-1")
            .await
            .unwrap()
            .resource
            .unwrap();
        prior.state = SubscriptionState::Renewing;

        let mut config = sample_config();
        config.domains.insert("api.example.com".to_string());
        let plan = plan(&ResourceSchema::tls_subscription(), Some(&prior), &config).unwrap();
        assert_eq!(plan.action, PlanAction::Replace);

        handler.apply(&plan, Some(&prior), &config).await.unwrap();

        let mutations: Vec<_> = api.calls().into_iter().filter(is_mutation).collect();
        assert!(matches!(mutations[0], Call::Delete(_)));
        assert!(matches!(mutations[1], Call::Create(_)));
    }

    #[test]
    fn test_validation_error_diagnostic_names_attribute() {
        let error = ResourceError::Validation(ValidationError::NoDomains);
        let diagnostic = error.to_diagnostic();
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.attribute.as_deref(), Some("domains"));
    }
}
