//! List managed extensions

use anyhow::Result;
use tabled::{Table, Tabled};

use tessera_core::keys::{KEY_CATEGORY, KEY_REVISION};
use tessera_extensions::MetadataSource;

use crate::cli::{Cli, ListArgs};
use crate::context::build_registry;
use crate::output;

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Revision")]
    revision: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Bookmarked")]
    bookmarked: String,
}

pub fn run(args: &ListArgs, cli: &Cli) -> Result<()> {
    let registry = build_registry(cli)?;

    let names = if args.installed {
        registry.installed_extensions()
    } else {
        registry.managed_extensions()
    };

    if args.json {
        let entries: Vec<_> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "installed": registry.is_extension_installed(name),
                    "enabled": registry.is_extension_enabled(name),
                    "bookmarked": registry.is_extension_bookmarked(name),
                    "metadata": registry.extension_metadata(name, MetadataSource::Local),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if names.is_empty() {
        output::info("No extensions");
        return Ok(());
    }

    let rows: Vec<ExtensionRow> = names
        .iter()
        .map(|name| {
            let metadata = registry.extension_metadata(name, MetadataSource::Local);
            let status = if !registry.is_extension_installed(name) {
                "not installed"
            } else if registry.is_extension_enabled(name) {
                "enabled"
            } else {
                "disabled"
            };
            ExtensionRow {
                name: name.clone(),
                revision: metadata.get(KEY_REVISION).cloned().unwrap_or_default(),
                category: metadata.get(KEY_CATEGORY).cloned().unwrap_or_default(),
                status: status.to_string(),
                bookmarked: if registry.is_extension_bookmarked(name) {
                    "yes".to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}
