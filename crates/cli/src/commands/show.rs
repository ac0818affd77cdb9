//! Show command - print local state

use anyhow::{Context, Result};
use fastly_tls_domain::flatmap;
use std::path::PathBuf;

use crate::args::ShowArgs;
use crate::commands::{load_required_state, state_store};
use crate::config::AppConfig;

pub async fn execute(args: ShowArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = state_store(&config, args.state);
    let resource = load_required_state(&store).await?;

    if args.flat {
        for (key, value) in flatmap::flatten(&resource) {
            println!("{} = {}", key, value);
        }
        return Ok(());
    }

    if args.json {
        let output =
            serde_json::to_string_pretty(&resource).context("Failed to serialize state")?;
        println!("{}", output);
        return Ok(());
    }

    println!("id                    = {}", resource.id);
    println!("state                 = {}", resource.state);
    println!("certificate_authority = {}", resource.certificate_authority);
    println!("common_name           = {}", resource.common_name);
    println!("configuration_id      = {}", resource.configuration_id);
    println!("certificate_id        = {}", resource.certificate_id);
    println!("domains:");
    for domain in &resource.domains {
        println!("  - {}", domain);
    }

    if !resource.managed_dns_challenges.is_empty() {
        println!("DNS challenges:");
        for challenge in &resource.managed_dns_challenges {
            println!(
                "  {} {} {}",
                challenge.record_name, challenge.record_type, challenge.record_value
            );
        }
    }
    if !resource.managed_http_challenges.is_empty() {
        println!("HTTP challenges:");
        for challenge in &resource.managed_http_challenges {
            let values: Vec<&str> = challenge.record_values.iter().map(String::as_str).collect();
            println!(
                "  {} {} {}",
                challenge.record_name,
                challenge.record_type,
                values.join(", ")
            );
        }
    }

    Ok(())
}
