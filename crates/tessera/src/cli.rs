//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tessera - extension management for the Tessera imaging application
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the settings file (default: <config dir>/tessera/settings.toml)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Application revision override
    #[arg(long, global = true, env = "TESSERA_APP_REVISION")]
    pub app_revision: Option<String>,

    /// Operating system override (linux, macosx, win)
    #[arg(long, global = true)]
    pub os: Option<String>,

    /// Architecture override (amd64, arm64, ...)
    #[arg(long, global = true)]
    pub arch: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List managed extensions
    List(ListArgs),

    /// Install an extension from an archive
    Install(InstallArgs),

    /// Schedule or perform extension removal
    Remove(RemoveArgs),

    /// Enable an extension
    Enable(EnableArgs),

    /// Disable an extension
    Disable(EnableArgs),

    /// Bookmark an extension
    Bookmark(BookmarkArgs),

    /// Show extension information
    Info(InfoArgs),

    /// Check compatibility and install prerequisites
    Check(CheckArgs),

    /// Refresh extension metadata from the catalog server
    Sync(SyncArgs),

    /// Stage, cancel, or apply extension updates
    Update(UpdateArgs),

    /// Export the extension list as JSON
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show installed extensions only
    #[arg(long)]
    pub installed: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Extension name
    pub name: String,

    /// Path to the extension archive (.tar.gz)
    pub archive: PathBuf,

    /// Install disabled instead of the default-enabled policy
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Extension name (omit with --all-scheduled)
    pub name: Option<String>,

    /// Remove immediately instead of scheduling
    #[arg(long, conflicts_with_all = ["cancel", "all_scheduled"])]
    pub now: bool,

    /// Cancel a scheduled removal
    #[arg(long, conflicts_with = "all_scheduled")]
    pub cancel: bool,

    /// Remove every extension scheduled for removal
    #[arg(long)]
    pub all_scheduled: bool,
}

#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Extension name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct BookmarkArgs {
    /// Extension name
    pub name: String,

    /// Remove the bookmark instead of adding it
    #[arg(long)]
    pub remove: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Extension name
    pub name: String,

    /// Metadata source
    #[arg(long, value_parser = ["all", "local", "server"], default_value = "all")]
    pub source: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Extension name (omit to check install prerequisites)
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Catalog server URL (default: Extensions/ServerUrl from settings)
    #[arg(long)]
    pub server: Option<String>,

    /// Application identifier on the catalog server
    #[arg(long, default_value = "tessera")]
    pub app_id: String,

    /// Refresh even if the cached metadata is still fresh
    #[arg(short, long)]
    pub force: bool,

    /// Compare installed revisions against the catalog afterwards
    #[arg(long)]
    pub check_updates: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Extension name (omit with --run)
    pub name: Option<String>,

    /// Update archive to stage for the extension
    #[arg(long, conflicts_with_all = ["cancel", "run"])]
    pub archive: Option<PathBuf>,

    /// Cancel a staged update
    #[arg(long, conflicts_with = "run")]
    pub cancel: bool,

    /// Apply every staged update
    #[arg(long)]
    pub run: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path
    pub output: PathBuf,
}
