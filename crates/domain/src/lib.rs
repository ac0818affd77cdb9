//! fastly-tls domain crate
//!
//! Core logic of the `fastly_tls_subscription` resource, following hexagonal
//! architecture:
//! - `model`: Remote entities, declarative configuration and state
//! - `ports`: Trait definitions for the remote API and state persistence
//! - `schema`: Declarative attribute schema of the resource
//! - `validation`: Input checks run before any remote call
//! - `usecases`: Plan, CRUD handlers and state reconciliation
//! - `hashcode` / `flatmap`: Set-element hash codes and legacy flat state

pub mod flatmap;
pub mod hashcode;
pub mod model;
pub mod ports;
pub mod schema;
pub mod usecases;
pub mod validation;

pub use model::*;
pub use ports::*;
pub use schema::{RESOURCE_TYPE, ResourceSchema};
pub use validation::ValidationError;
