//! Import command - adopt an existing subscription

use anyhow::{Result, bail};
use fastly_tls_domain::usecases::SubscriptionHandler;
use std::path::PathBuf;

use crate::args::ImportArgs;
use crate::commands::{build_api, fail, load_state, print_diagnostics, state_store, store_outcome};
use crate::config::AppConfig;

pub async fn execute(args: ImportArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = state_store(&config, args.state);

    if let Some(existing) = load_state(&store).await? {
        bail!(
            "State at {} already tracks TLS subscription {}",
            store.path().display(),
            existing.id
        );
    }

    let api = build_api(&config, store.path()).await?;
    let handler = SubscriptionHandler::new(&*api);

    let outcome = handler
        .import(&args.id)
        .await
        .map_err(|e| fail("import", e))?;

    let Some(resource) = &outcome.resource else {
        print_diagnostics(&outcome.diagnostics);
        bail!("Cannot import non-existent TLS subscription {}", args.id);
    };

    store_outcome(&store, &outcome).await?;
    println!(
        "Imported TLS subscription {} ({}, {} domains)",
        resource.id,
        resource.state,
        resource.domains.len()
    );

    Ok(())
}
