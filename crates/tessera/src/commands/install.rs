//! Install an extension from an archive

use anyhow::Result;

use tessera_core::ExtensionMetadata;

use crate::cli::{Cli, InstallArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &InstallArgs, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;
    if args.disabled {
        registry.set_new_extension_enabled_by_default(false);
    }

    // Metadata comes from the description file bundled in the archive
    registry.install_extension(&args.name, ExtensionMetadata::new(), &args.archive)?;

    let reasons = registry.is_extension_compatible(&args.name);
    if !reasons.is_empty() {
        for reason in &reasons {
            output::warning(reason);
        }
    }
    output::success(&format!("Installed extension '{}'", args.name));
    Ok(())
}
