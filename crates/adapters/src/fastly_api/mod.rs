//! Fastly TLS subscription API adapter

mod wire;

use async_trait::async_trait;
use fastly_tls_domain::{
    ApiError, CreateSubscriptionInput, DeleteSubscriptionInput, GetSubscriptionInput,
    ListDomainsInput, Subscription, TlsDomain, TlsSubscriptionApi, UpdateSubscriptionInput,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use wire::{
    Document, Relationship, ResourceObject, SubscriptionAttributes, TYPE_CONFIGURATION,
    TYPE_DOMAIN, TYPE_SUBSCRIPTION, WriteAttributes, WriteDocument, WriteResource,
};

const JSON_API: &str = "application/vnd.api+json";

/// Default Fastly API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.fastly.com";

/// HTTP client for the Fastly TLS subscription endpoints
pub struct FastlyTlsApi {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl FastlyTlsApi {
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), timeout)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Fastly-Key", self.api_key.expose_secret())
            .header(ACCEPT, JSON_API)
    }

    /// Send a request, mapping error statuses onto `ApiError`
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = wire::error_message(&body);

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(format!("{}: {}", what, message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            _ => ApiError::Api {
                status: status.as_u16(),
                message: format!("{} failed: {}", what, message),
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    fn relationships(
        domains: &[String],
        common_name: Option<&str>,
        configuration_id: Option<&str>,
    ) -> BTreeMap<&'static str, Relationship> {
        let mut relationships = BTreeMap::new();
        relationships.insert("tls_domains", Relationship::many(TYPE_DOMAIN, domains));
        if let Some(common_name) = common_name {
            relationships.insert("common_name", Relationship::one(TYPE_DOMAIN, common_name));
        }
        if let Some(configuration_id) = configuration_id {
            relationships.insert(
                "tls_configuration",
                Relationship::one(TYPE_CONFIGURATION, configuration_id),
            );
        }
        relationships
    }

    fn force_query(force: bool) -> Vec<(&'static str, &'static str)> {
        if force { vec![("force", "true")] } else { vec![] }
    }
}

#[async_trait]
impl TlsSubscriptionApi for FastlyTlsApi {
    async fn create_subscription(
        &self,
        input: CreateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let body = WriteDocument {
            data: WriteResource {
                id: None,
                kind: TYPE_SUBSCRIPTION,
                attributes: Some(WriteAttributes {
                    certificate_authority: input.certificate_authority.to_string(),
                }),
                relationships: Self::relationships(
                    &input.domains,
                    input.common_name.as_deref(),
                    input.configuration_id.as_deref(),
                ),
            },
        };

        tracing::debug!(domains = ?input.domains, "Creating TLS subscription");

        let request = self
            .request(Method::POST, "/tls/subscriptions")
            .header(CONTENT_TYPE, JSON_API)
            .json(&body);
        let response = self.send(request, "Create TLS subscription").await?;

        let document: Document<ResourceObject<SubscriptionAttributes>> =
            Self::decode(response).await?;
        wire::subscription_from_document(document)
    }

    async fn get_subscription(
        &self,
        input: GetSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let mut request = self.request(Method::GET, &format!("/tls/subscriptions/{}", input.id));
        if let Some(include) = &input.include {
            request = request.query(&[("include", include.as_str())]);
        }

        let response = self
            .send(request, &format!("TLS subscription {}", input.id))
            .await?;

        let document: Document<ResourceObject<SubscriptionAttributes>> =
            Self::decode(response).await?;
        wire::subscription_from_document(document)
    }

    async fn update_subscription(
        &self,
        input: UpdateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        let body = WriteDocument {
            data: WriteResource {
                id: Some(input.id.clone()),
                kind: TYPE_SUBSCRIPTION,
                attributes: None,
                relationships: Self::relationships(
                    &input.domains,
                    Some(input.common_name.as_str()),
                    Some(input.configuration_id.as_str()).filter(|id| !id.is_empty()),
                ),
            },
        };

        let request = self
            .request(Method::PATCH, &format!("/tls/subscriptions/{}", input.id))
            .query(&Self::force_query(input.force))
            .header(CONTENT_TYPE, JSON_API)
            .json(&body);
        let response = self
            .send(request, &format!("Update TLS subscription {}", input.id))
            .await?;

        let document: Document<ResourceObject<SubscriptionAttributes>> =
            Self::decode(response).await?;
        wire::subscription_from_document(document)
    }

    async fn delete_subscription(&self, input: DeleteSubscriptionInput) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, &format!("/tls/subscriptions/{}", input.id))
            .query(&Self::force_query(input.force));
        self.send(request, &format!("Delete TLS subscription {}", input.id))
            .await?;
        Ok(())
    }

    async fn list_domains(&self, input: ListDomainsInput) -> Result<Vec<TlsDomain>, ApiError> {
        let mut query = Vec::new();
        if let Some(certificate_id) = &input.filter_certificate_id {
            query.push(("filter[tls_certificates.id]", certificate_id.as_str()));
        }
        if let Some(include) = &input.include {
            query.push(("include", include.as_str()));
        }
        if let Some(sort) = &input.sort {
            query.push(("sort", sort.as_str()));
        }

        let request = self.request(Method::GET, "/tls/domains").query(&query);
        let response = self.send(request, "List TLS domains").await?;

        let document: Document<Vec<ResourceObject<serde_json::Value>>> =
            Self::decode(response).await?;
        let domains = wire::domains_from_document(document)?;

        tracing::debug!(count = domains.len(), "Listed TLS domains");
        Ok(domains)
    }
}
