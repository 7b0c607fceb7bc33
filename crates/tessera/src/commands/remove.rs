//! Schedule, cancel, or perform extension removal

use anyhow::{anyhow, bail, Result};

use crate::cli::{Cli, RemoveArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &RemoveArgs, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;

    if args.all_scheduled {
        let outcome = registry.uninstall_scheduled_extensions()?;
        for name in &outcome.completed {
            output::success(&format!("Removed extension '{name}'"));
        }
        for (name, reason) in &outcome.failed {
            output::warning(&format!("Failed to remove '{name}': {reason}"));
        }
        if !outcome.is_success() {
            bail!("{} extension(s) could not be removed", outcome.failed.len());
        }
        if outcome.completed.is_empty() {
            output::info("No extensions scheduled for removal");
        }
        return Ok(());
    }

    let name = args
        .name
        .as_deref()
        .ok_or_else(|| anyhow!("Extension name required (or use --all-scheduled)"))?;

    if args.cancel {
        registry.cancel_extension_scheduled_for_uninstall(name)?;
        output::success(&format!("Cancelled removal of '{name}'"));
    } else if args.now {
        registry.uninstall_extension(name)?;
        output::success(&format!("Removed extension '{name}'"));
    } else {
        registry.schedule_extension_for_uninstall(name)?;
        output::success(&format!(
            "Extension '{name}' scheduled for removal; run 'tessera remove --all-scheduled' to apply"
        ));
    }
    Ok(())
}
