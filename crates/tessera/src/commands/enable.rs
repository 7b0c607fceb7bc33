//! Enable or disable an extension

use anyhow::Result;

use crate::cli::{Cli, EnableArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &EnableArgs, enabled: bool, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;
    registry.set_extension_enabled(&args.name, enabled)?;
    output::success(&format!(
        "Extension '{}' {}",
        args.name,
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}
