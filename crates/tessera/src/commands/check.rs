//! Check compatibility and install prerequisites

use anyhow::Result;

use crate::cli::{CheckArgs, Cli};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let registry = build_registry(cli)?;

    match &args.name {
        Some(name) => {
            let reasons = registry.is_extension_compatible(name);
            if reasons.is_empty() {
                output::success(&format!("Extension '{name}' is compatible"));
            } else {
                for reason in &reasons {
                    output::warning(reason);
                }
            }
        }
        None => {
            registry.check_install_prerequisites()?;
            output::success("Install prerequisites satisfied");
            output::kv(
                "install root",
                &registry.install_root()?.display().to_string(),
            );
            let requirements = registry.requirements();
            output::kv("revision", &requirements.revision);
            output::kv("os", &requirements.os);
            output::kv("arch", &requirements.arch);

            let scheduled = registry.extensions_scheduled_for_uninstall()?;
            if !scheduled.is_empty() {
                output::info(&format!("Scheduled for removal: {}", scheduled.join(", ")));
            }
            let updates = registry.extensions_scheduled_for_update()?;
            if !updates.is_empty() {
                output::info(&format!("Scheduled for update: {}", updates.join(", ")));
            }
            if registry.is_metadata_refresh_due()? {
                output::info("Catalog metadata is stale; run 'tessera sync'");
            }
        }
    }
    Ok(())
}
