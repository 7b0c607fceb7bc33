//! Stage, cancel, or apply extension updates

use anyhow::{anyhow, bail, Result};

use crate::cli::{Cli, UpdateArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &UpdateArgs, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;

    if args.run {
        let outcome = registry.update_scheduled_extensions()?;
        for name in &outcome.completed {
            output::success(&format!("Updated extension '{name}'"));
        }
        for (name, reason) in &outcome.failed {
            output::warning(&format!("Failed to update '{name}': {reason}"));
        }
        if !outcome.is_success() {
            bail!("{} extension(s) could not be updated", outcome.failed.len());
        }
        if outcome.completed.is_empty() {
            output::info("No extensions scheduled for update");
        }
        return Ok(());
    }

    let name = args
        .name
        .as_deref()
        .ok_or_else(|| anyhow!("Extension name required (or use --run)"))?;

    if args.cancel {
        registry.cancel_extension_scheduled_for_update(name)?;
        output::success(&format!("Cancelled update of '{name}'"));
        return Ok(());
    }

    let archive = args
        .archive
        .as_deref()
        .ok_or_else(|| anyhow!("--archive required to stage an update"))?;
    registry.schedule_extension_for_update(name, archive)?;
    output::success(&format!(
        "Extension '{name}' scheduled for update; run 'tessera update --run' to apply"
    ));
    Ok(())
}
