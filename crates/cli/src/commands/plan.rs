//! Plan command - compare a resource file against local state

use anyhow::{Context, Result};
use fastly_tls_domain::{
    ResourceSchema,
    usecases::{Plan, PlanAction, plan},
};
use std::path::PathBuf;

use crate::args::PlanArgs;
use crate::commands::{fail, load_resource_config, load_state, state_store};
use crate::config::AppConfig;

pub async fn execute(args: PlanArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let resource_config = load_resource_config(&args.resource)?;
    let store = state_store(&config, args.state);
    let prior = load_state(&store).await?;

    let schema = ResourceSchema::tls_subscription();
    let plan = plan(&schema, prior.as_ref(), &resource_config).map_err(|e| fail("plan", e))?;

    if args.json {
        let output = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", output);
    } else {
        print_plan(&plan, prior.as_ref().map(|p| p.id.as_str()));
    }

    Ok(())
}

pub(crate) fn print_plan(plan: &Plan, id: Option<&str>) {
    let target = id.unwrap_or("(new)");
    match plan.action {
        PlanAction::NoOp => {
            println!("No changes. TLS subscription {} is up to date.", target);
            return;
        }
        PlanAction::Create => println!("TLS subscription will be created"),
        PlanAction::Update => println!("TLS subscription {} will be updated in place", target),
        PlanAction::Replace => println!("TLS subscription {} must be replaced", target),
    }

    let marker = if plan.action == PlanAction::Create { "+" } else { "~" };
    for name in &plan.changed {
        if plan.requires_replace.contains(name) {
            println!("  {} {} (forces replacement)", marker, name);
        } else {
            println!("  {} {}", marker, name);
        }
    }
    for name in &plan.unknown_after_apply {
        println!("  + {} (known after apply)", name);
    }
}
