//! Plan computation: what applying a configuration to prior state would do

use serde::Serialize;

use crate::model::{SubscriptionConfig, SubscriptionResource};
use crate::schema::ResourceSchema;
use crate::validation::{ValidationError, validate_common_name, validate_domains};

/// Attributes that can only change in place while the subscription is
/// issued or pending
const STATE_SENSITIVE: [&str; 3] = ["configuration_id", "domains", "common_name"];

/// Computed sets that are stale as soon as the domain set changes
const DOMAIN_DERIVED: [&str; 2] = ["managed_dns_challenges", "managed_http_challenges"];

/// Action required to reach the configured state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    /// Delete, then create
    Replace,
    NoOp,
}

/// Outcome of planning a configuration against prior state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    /// Attributes whose configured value differs from state
    pub changed: Vec<&'static str>,
    /// Changed attributes that force replacement
    pub requires_replace: Vec<&'static str>,
    /// Computed attributes whose values are not known until apply
    pub unknown_after_apply: Vec<&'static str>,
}

/// Compute the plan for `config` given the prior state, if any.
///
/// Validation runs first, so uppercase domains never reach the API.
pub fn plan(
    schema: &ResourceSchema,
    prior: Option<&SubscriptionResource>,
    config: &SubscriptionConfig,
) -> Result<Plan, ValidationError> {
    validate_domains(&config.domains)?;
    if let Some(common_name) = &config.common_name {
        validate_common_name(common_name)?;
    }

    let Some(prior) = prior else {
        return Ok(create_plan(schema, config));
    };

    let changed = changed_attributes(prior, config);

    let mut requires_replace: Vec<&'static str> = schema
        .force_new_attributes()
        .filter(|name| changed.contains(name))
        .collect();

    if !prior.state.allows_update() {
        requires_replace.extend(STATE_SENSITIVE.iter().filter(|name| changed.contains(*name)));
    }

    let unknown_after_apply = if changed.contains(&"domains") {
        DOMAIN_DERIVED.to_vec()
    } else {
        vec![]
    };

    let action = if !requires_replace.is_empty() {
        PlanAction::Replace
    } else if !changed.is_empty() {
        PlanAction::Update
    } else {
        PlanAction::NoOp
    };

    tracing::debug!(
        id = %prior.id,
        action = ?action,
        changed = ?changed,
        requires_replace = ?requires_replace,
        "Planned TLS subscription"
    );

    Ok(Plan {
        action,
        changed,
        requires_replace,
        unknown_after_apply,
    })
}

fn create_plan(schema: &ResourceSchema, config: &SubscriptionConfig) -> Plan {
    let configured = |name: &str| match name {
        "common_name" => config.common_name.is_some(),
        "configuration_id" => config.configuration_id.is_some(),
        _ => false,
    };

    Plan {
        action: PlanAction::Create,
        changed: schema
            .attributes
            .iter()
            .filter(|a| a.required || a.optional)
            .map(|a| a.name)
            .collect(),
        requires_replace: vec![],
        unknown_after_apply: schema
            .attributes
            .iter()
            .filter(|a| a.computed && !configured(a.name))
            .map(|a| a.name)
            .collect(),
    }
}

/// Optional+computed attributes only count as changed when configured
fn changed_attributes(prior: &SubscriptionResource, config: &SubscriptionConfig) -> Vec<&'static str> {
    let mut changed = vec![];

    if config.certificate_authority.as_str() != prior.certificate_authority {
        changed.push("certificate_authority");
    }
    if config
        .common_name
        .as_ref()
        .is_some_and(|cn| *cn != prior.common_name)
    {
        changed.push("common_name");
    }
    if config
        .configuration_id
        .as_ref()
        .is_some_and(|id| *id != prior.configuration_id)
    {
        changed.push("configuration_id");
    }
    if config.domains != prior.domains {
        changed.push("domains");
    }
    if config.force_destroy != prior.force_destroy {
        changed.push("force_destroy");
    }
    if config.force_update != prior.force_update {
        changed.push("force_update");
    }

    changed
}
