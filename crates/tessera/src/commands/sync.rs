//! Refresh extension metadata from the catalog server

use anyhow::{anyhow, Result};

use tessera_extensions::{CatalogClient, ServerApi};

use crate::cli::{Cli, SyncArgs};
use crate::context::build_registry;
use crate::output;

pub async fn run(args: &SyncArgs, cli: &Cli) -> Result<()> {
    let mut registry = build_registry(cli)?;

    if !args.force && !registry.is_metadata_refresh_due()? {
        output::info("Catalog metadata is still fresh; use --force to refresh anyway");
        if args.check_updates {
            report_updates(&mut registry);
        }
        return Ok(());
    }

    let server = match &args.server {
        Some(url) => url.clone(),
        None => registry
            .server_url()?
            .ok_or_else(|| anyhow!("No catalog server configured; pass --server or set Extensions/ServerUrl"))?,
    };

    let client = CatalogClient::new(&server, ServerApi::GirderV1)?;
    let metadata = client
        .fetch_extensions(&args.app_id, registry.requirements())
        .await?;
    let count = metadata.len();
    registry.apply_server_metadata(metadata, Some(&server))?;
    output::success(&format!("Fetched metadata for {count} extensions from {server}"));

    if args.check_updates {
        report_updates(&mut registry);
    }
    Ok(())
}

fn report_updates(registry: &mut tessera_extensions::ExtensionRegistry) {
    let updates = registry.check_for_updates();
    if updates.is_empty() {
        output::info("All installed extensions are up to date");
    } else {
        output::info(&format!("Updates available: {}", updates.join(", ")));
    }
}
