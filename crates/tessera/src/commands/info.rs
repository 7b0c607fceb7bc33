//! Show extension information

use anyhow::{bail, Result};

use tessera_extensions::MetadataSource;

use crate::cli::{Cli, InfoArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let registry = build_registry(cli)?;

    let source = match args.source.as_str() {
        "local" => MetadataSource::Local,
        "server" => MetadataSource::Server,
        _ => MetadataSource::All,
    };
    let metadata = registry.extension_metadata(&args.name, source);
    if metadata.is_empty() {
        bail!("No metadata for extension '{}'", args.name);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("{}", args.name);
    output::kv(
        "state",
        if registry.is_extension_installed(&args.name) {
            if registry.is_extension_enabled(&args.name) {
                "installed, enabled"
            } else {
                "installed, disabled"
            }
        } else {
            "not installed"
        },
    );
    output::kv(
        "bookmarked",
        if registry.is_extension_bookmarked(&args.name) {
            "yes"
        } else {
            "no"
        },
    );
    if registry.is_update_available(&args.name) {
        output::kv("update", "available");
    }
    for (key, value) in &metadata {
        output::kv(key, value);
    }

    let reasons = registry.is_extension_compatible(&args.name);
    if !reasons.is_empty() {
        for reason in &reasons {
            output::warning(reason);
        }
    }
    Ok(())
}
