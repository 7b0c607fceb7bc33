//! Registry construction shared by all commands

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::debug;

use tessera_core::keys::{SETTINGS_APP_REVISION, SETTINGS_INSTALL_PATH};
use tessera_core::{Requirements, SettingsStore, TomlSettings};
use tessera_extensions::events::TracingObserver;
use tessera_extensions::ExtensionRegistry;

use crate::cli::Cli;

/// Location of the settings document.
pub fn settings_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.settings {
        return Ok(path.clone());
    }
    let config = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config.join("tessera").join("settings.toml"))
}

/// Operating system name in the descriptor vocabulary.
fn default_os() -> String {
    match std::env::consts::OS {
        "macos" => "macosx".to_string(),
        "windows" => "win".to_string(),
        other => other.to_string(),
    }
}

/// Architecture name in the descriptor vocabulary.
fn default_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Build the registry from settings and global CLI overrides, load the
/// cached catalog metadata, and populate the model from disk.
pub fn build_registry(cli: &Cli) -> Result<ExtensionRegistry> {
    let path = settings_path(cli)?;
    debug!("Using settings file {}", path.display());
    let mut settings = TomlSettings::new(&path);

    // First run: point the install root at the data directory
    if settings.get_string(SETTINGS_INSTALL_PATH)?.is_none() {
        let data = dirs::data_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
        let install_root = data.join("tessera").join("extensions");
        settings.set_string(SETTINGS_INSTALL_PATH, &install_root.display().to_string())?;
    }

    let revision = match &cli.app_revision {
        Some(revision) => revision.clone(),
        None => settings.get_string(SETTINGS_APP_REVISION)?.unwrap_or_default(),
    };
    let os = cli.os.clone().unwrap_or_else(default_os);
    let arch = cli.arch.clone().unwrap_or_else(default_arch);

    let mut registry = ExtensionRegistry::new(
        Box::new(settings),
        Requirements::new(revision, os, arch),
    );
    registry.subscribe(Box::new(TracingObserver));
    registry.load_cached_server_metadata()?;
    registry.update_model()?;
    Ok(registry)
}
