//! Bookmark management

use anyhow::Result;

use crate::cli::{BookmarkArgs, Cli};
use crate::context::build_registry;
use crate::output;

pub fn run(args: &BookmarkArgs, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;
    registry.set_extension_bookmarked(&args.name, !args.remove)?;
    if args.remove {
        output::success(&format!("Removed bookmark for '{}'", args.name));
    } else {
        output::success(&format!("Bookmarked extension '{}'", args.name));
    }
    Ok(())
}
