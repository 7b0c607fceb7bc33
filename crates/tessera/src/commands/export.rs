//! Export the extension list as JSON

use anyhow::Result;

use crate::cli::{Cli, ExportArgs};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &ExportArgs, cli: &Cli) -> Result<()> {
    let registry = build_registry(cli)?;
    registry.export_extension_list(&args.output)?;
    output::success(&format!(
        "Exported {} extensions to {}",
        registry.managed_extensions().len(),
        args.output.display()
    ));
    Ok(())
}
