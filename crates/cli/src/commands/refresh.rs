//! Refresh command - re-read the subscription into local state

use anyhow::Result;
use fastly_tls_domain::{LocalSettings, usecases::SubscriptionHandler};
use std::path::PathBuf;

use crate::args::StateArgs;
use crate::commands::{build_api, fail, load_required_state, state_store, store_outcome};
use crate::config::AppConfig;

pub async fn execute(args: StateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = state_store(&config, args.state);
    let stored = load_required_state(&store).await?;

    let api = build_api(&config, store.path()).await?;
    let handler = SubscriptionHandler::new(&*api);

    let outcome = handler
        .read(&stored.id, LocalSettings::from(&stored))
        .await
        .map_err(|e| fail("refresh", e))?;
    store_outcome(&store, &outcome).await?;

    if let Some(resource) = &outcome.resource {
        if resource.configuration_id != stored.configuration_id {
            tracing::warn!(
                id = %resource.id,
                previous = %stored.configuration_id,
                current = %resource.configuration_id,
                "Configuration changed outside of fastly-tls"
            );
        }
        println!("Refreshed TLS subscription {} ({})", resource.id, resource.state);
    }

    Ok(())
}
