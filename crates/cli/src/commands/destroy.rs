//! Destroy command - delete the subscription and clear local state

use anyhow::{Context, Result};
use fastly_tls_domain::{ResourceStateStore, usecases::SubscriptionHandler};
use std::path::PathBuf;

use crate::args::StateArgs;
use crate::commands::{build_api, fail, load_required_state, state_store};
use crate::config::AppConfig;

pub async fn execute(args: StateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = state_store(&config, args.state);
    let resource = load_required_state(&store).await?;

    let api = build_api(&config, store.path()).await?;
    let handler = SubscriptionHandler::new(&*api);

    handler
        .delete(&resource)
        .await
        .map_err(|e| fail("destroy", e))?;

    store
        .remove()
        .await
        .with_context(|| format!("Failed to remove state: {}", store.path().display()))?;

    println!("Destroyed TLS subscription {}", resource.id);
    Ok(())
}
