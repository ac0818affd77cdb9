//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    CreateSubscriptionInput, DeleteSubscriptionInput, GetSubscriptionInput, ListDomainsInput,
    Subscription, SubscriptionResource, TlsDomain, UpdateSubscriptionInput,
};

/// Error type for remote TLS API operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Port for the remote TLS subscription API
#[async_trait]
pub trait TlsSubscriptionApi: Send + Sync {
    /// Create a subscription and return it as stored remotely
    async fn create_subscription(
        &self,
        input: CreateSubscriptionInput,
    ) -> Result<Subscription, ApiError>;

    /// Fetch a subscription, optionally side-loading related records
    async fn get_subscription(&self, input: GetSubscriptionInput)
    -> Result<Subscription, ApiError>;

    async fn update_subscription(
        &self,
        input: UpdateSubscriptionInput,
    ) -> Result<Subscription, ApiError>;

    async fn delete_subscription(&self, input: DeleteSubscriptionInput) -> Result<(), ApiError>;

    /// List TLS domains, in the order the API sorted them
    async fn list_domains(&self, input: ListDomainsInput) -> Result<Vec<TlsDomain>, ApiError>;
}

#[async_trait]
impl<A: TlsSubscriptionApi + ?Sized> TlsSubscriptionApi for &A {
    async fn create_subscription(
        &self,
        input: CreateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        (**self).create_subscription(input).await
    }

    async fn get_subscription(
        &self,
        input: GetSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        (**self).get_subscription(input).await
    }

    async fn update_subscription(
        &self,
        input: UpdateSubscriptionInput,
    ) -> Result<Subscription, ApiError> {
        (**self).update_subscription(input).await
    }

    async fn delete_subscription(&self, input: DeleteSubscriptionInput) -> Result<(), ApiError> {
        (**self).delete_subscription(input).await
    }

    async fn list_domains(&self, input: ListDomainsInput) -> Result<Vec<TlsDomain>, ApiError> {
        (**self).list_domains(input).await
    }
}

/// Error type for resource state persistence
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting resource state between runs
#[async_trait]
pub trait ResourceStateStore: Send + Sync {
    /// Load the stored state, if any
    async fn load(&self) -> Result<Option<SubscriptionResource>, StateError>;

    /// Replace the stored state
    async fn save(&self, resource: &SubscriptionResource) -> Result<(), StateError>;

    /// Forget the stored state
    async fn remove(&self) -> Result<(), StateError>;
}
