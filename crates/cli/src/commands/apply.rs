//! Apply command - bring the remote subscription in line with a resource file

use anyhow::Result;
use fastly_tls_domain::{
    LocalSettings, ResourceSchema,
    usecases::{PlanAction, SubscriptionHandler, plan},
};
use std::path::PathBuf;

use crate::args::ApplyArgs;
use crate::commands::{
    build_api, fail, load_resource_config, load_state, plan::print_plan, print_diagnostics,
    state_store, store_outcome,
};
use crate::config::AppConfig;

pub async fn execute(args: ApplyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let resource_config = load_resource_config(&args.resource)?;
    let store = state_store(&config, args.state);

    let api = build_api(&config, store.path()).await?;
    let handler = SubscriptionHandler::new(&*api);

    // Refresh before planning so drift is taken into account
    let prior = match load_state(&store).await? {
        Some(stored) => {
            let outcome = handler
                .read(&stored.id, LocalSettings::from(&stored))
                .await
                .map_err(|e| fail("refresh", e))?;
            print_diagnostics(&outcome.diagnostics);
            outcome.resource
        }
        None => None,
    };

    let schema = ResourceSchema::tls_subscription();
    let plan = plan(&schema, prior.as_ref(), &resource_config).map_err(|e| fail("plan", e))?;
    print_plan(&plan, prior.as_ref().map(|p| p.id.as_str()));

    tracing::info!(
        action = ?plan.action,
        changed = ?plan.changed,
        state = %store.path().display(),
        "Applying TLS subscription"
    );

    let outcome = handler
        .apply(&plan, prior.as_ref(), &resource_config)
        .await
        .map_err(|e| fail("apply", e))?;
    store_outcome(&store, &outcome).await?;

    match (&outcome.resource, plan.action) {
        (Some(resource), PlanAction::NoOp) => {
            println!("TLS subscription {} refreshed ({})", resource.id, resource.state)
        }
        (Some(resource), _) => {
            println!("Applied TLS subscription {} ({})", resource.id, resource.state)
        }
        (None, _) => println!("TLS subscription no longer exists; state cleared"),
    }

    Ok(())
}
