//! Command implementations

pub mod apply;
pub mod config;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod schema;
pub mod show;

use anyhow::{Context, Result, bail};
use fastly_tls_adapters::{
    api::{FastlyTlsApi, InMemoryTlsApi},
    state::JsonFileStateStore,
};
use fastly_tls_domain::{
    Diagnostic, ReadOutcome, ResourceStateStore, Severity, SubscriptionConfig,
    SubscriptionResource, TlsSubscriptionApi, usecases::ResourceError,
};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::AppConfig;

/// File next to the state file that backs the `memory` provider
const MEMORY_STORE_FILE: &str = "memory-api.json";

pub(crate) async fn build_api(
    config: &AppConfig,
    state_path: &Path,
) -> Result<Box<dyn TlsSubscriptionApi>> {
    let provider = config.api.provider.trim().to_lowercase();

    match provider.as_str() {
        "fastly" => {
            let api_key = load_api_key(&config.api.api_key_env)?;
            let api = FastlyTlsApi::with_base_url(
                api_key,
                config.api.base_url.clone(),
                Duration::from_secs(config.api.timeout_secs),
            )
            .context("Failed to create Fastly API client")?;
            Ok(Box::new(api))
        }
        "memory" => {
            let path = state_path.with_file_name(MEMORY_STORE_FILE);
            tracing::warn!(store = %path.display(), "Using in-memory TLS API; nothing is sent to Fastly");
            let api = InMemoryTlsApi::open(&path)
                .await
                .with_context(|| format!("Failed to open memory store: {}", path.display()))?;
            Ok(Box::new(api))
        }
        other => bail!("Unknown API provider: {} (expected fastly or memory)", other),
    }
}

pub(crate) fn load_api_key(env_var: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured");
    }

    let key = std::env::var(env_var)
        .with_context(|| format!("Missing API key env var {}", env_var))?;

    if key.trim().is_empty() {
        bail!("API key env var {} is empty", env_var);
    }

    Ok(SecretString::new(key.into()))
}

/// Read a declarative resource file
pub(crate) fn load_resource_config(path: &Path) -> Result<SubscriptionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse resource file: {}", path.display()))
}

pub(crate) fn state_store(config: &AppConfig, state: Option<PathBuf>) -> JsonFileStateStore {
    JsonFileStateStore::new(state.unwrap_or_else(|| config.default_state_path()))
}

pub(crate) async fn load_state(store: &JsonFileStateStore) -> Result<Option<SubscriptionResource>> {
    store
        .load()
        .await
        .with_context(|| format!("Failed to load state: {}", store.path().display()))
}

pub(crate) async fn load_required_state(store: &JsonFileStateStore) -> Result<SubscriptionResource> {
    match load_state(store).await? {
        Some(resource) => Ok(resource),
        None => bail!("No state found at {}", store.path().display()),
    }
}

/// Persist or clear state to match a read outcome
pub(crate) async fn store_outcome(
    store: &JsonFileStateStore,
    outcome: &ReadOutcome,
) -> Result<()> {
    print_diagnostics(&outcome.diagnostics);

    match &outcome.resource {
        Some(resource) => store
            .save(resource)
            .await
            .with_context(|| format!("Failed to save state: {}", store.path().display())),
        None => store
            .remove()
            .await
            .with_context(|| format!("Failed to remove state: {}", store.path().display())),
    }
}

pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        match &diagnostic.attribute {
            Some(attribute) => eprintln!("{}: {} (at {})", label, diagnostic.summary, attribute),
            None => eprintln!("{}: {}", label, diagnostic.summary),
        }
        if let Some(detail) = &diagnostic.detail {
            eprintln!("  {}", detail);
        }
    }
}

/// Report a failed resource operation as a diagnostic
pub(crate) fn fail(operation: &str, err: impl Into<ResourceError>) -> anyhow::Error {
    let diagnostic = err.into().to_diagnostic();
    print_diagnostics(std::slice::from_ref(&diagnostic));
    anyhow::anyhow!("{} failed", operation)
}
