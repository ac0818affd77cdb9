//! Schema command - print the resource schema as JSON

use anyhow::{Context, Result};
use fastly_tls_domain::ResourceSchema;

use crate::args::SchemaArgs;

pub fn execute(args: SchemaArgs) -> Result<()> {
    let schema = ResourceSchema::tls_subscription();

    let output = if args.pretty {
        serde_json::to_string_pretty(&schema)
    } else {
        serde_json::to_string(&schema)
    }
    .context("Failed to serialize schema")?;

    println!("{}", output);
    Ok(())
}
