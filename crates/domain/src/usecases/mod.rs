//! Application use cases / resource logic

pub mod lifecycle;
pub mod plan;
pub mod reconcile;

pub use lifecycle::{ResourceError, SubscriptionHandler};
pub use plan::{Plan, PlanAction, plan};
