//! fastly-tls adapters crate
//!
//! Infrastructure adapters implementing the domain ports:
//! - `fastly`: Fastly TLS subscription API over HTTP
//! - `memory`: In-memory API for tests and offline runs
//! - `state`: JSON file resource state store

mod state_fs;
mod tls_memory;

pub mod fastly_api;

/// Re-exports for API adapters
pub mod api {
    pub use crate::fastly_api::{DEFAULT_BASE_URL, FastlyTlsApi};
    pub use crate::tls_memory::InMemoryTlsApi;
}

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_fs::JsonFileStateStore;
}
