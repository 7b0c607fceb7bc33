//! Error types for tessera-core

use thiserror::Error;

/// Result type alias using tessera-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Tessera
#[derive(Error, Debug)]
pub enum Error {
    /// Extension name was empty
    #[error("Extension name must not be empty")]
    EmptyExtensionName,

    /// Extension is already installed
    #[error("Extension '{name}' is already installed")]
    AlreadyInstalled { name: String },

    /// Extension is not installed
    #[error("Extension '{name}' is not installed")]
    NotInstalled { name: String },

    /// Extension is loaded into the running application
    #[error("Extension '{name}' is loaded and cannot be removed now; schedule it for removal instead")]
    ExtensionLoaded { name: String },

    /// Extension is scheduled for uninstall
    #[error("Extension '{name}' is scheduled for removal")]
    ScheduledForUninstall { name: String },

    /// Extension is not scheduled for uninstall
    #[error("Extension '{name}' is not scheduled for removal")]
    NotScheduledForUninstall { name: String },

    /// Extension is not scheduled for update
    #[error("Extension '{name}' is not scheduled for update")]
    NotScheduledForUpdate { name: String },

    /// Extension is incompatible with the running application
    #[error("Extension '{name}' is incompatible: {reasons}")]
    Incompatible { name: String, reasons: String },

    /// No install root configured
    #[error("Extensions install path is not set")]
    InstallRootNotSet,

    /// Install root cannot be used
    #[error("Extensions install path '{path}' is not usable: {reason}")]
    InstallRootUnavailable { path: String, reason: String },

    /// Settings store rejected a write
    #[error("Settings are not writable")]
    SettingsNotWritable,

    /// Archive contained no files
    #[error("Archive '{path}' contains no files")]
    EmptyArchive { path: String },

    /// Archive does not have a single top-level directory
    #[error("Archive '{path}' must contain exactly one top-level directory: {detail}")]
    InvalidArchiveLayout { path: String, detail: String },

    /// Description file could not be parsed
    #[error("Invalid extension description file '{path}': {message}")]
    InvalidDescriptor { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Settings document parsing error
    #[error("Settings parsing error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    /// Settings document serialization error
    #[error("Settings serialization error: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Create an already-installed error
    pub fn already_installed(name: impl Into<String>) -> Self {
        Self::AlreadyInstalled { name: name.into() }
    }

    /// Create a not-installed error
    pub fn not_installed(name: impl Into<String>) -> Self {
        Self::NotInstalled { name: name.into() }
    }

    /// Create a loaded-extension error
    pub fn extension_loaded(name: impl Into<String>) -> Self {
        Self::ExtensionLoaded { name: name.into() }
    }

    /// Create a scheduled-for-uninstall error
    pub fn scheduled_for_uninstall(name: impl Into<String>) -> Self {
        Self::ScheduledForUninstall { name: name.into() }
    }

    /// Create a not-scheduled-for-uninstall error
    pub fn not_scheduled_for_uninstall(name: impl Into<String>) -> Self {
        Self::NotScheduledForUninstall { name: name.into() }
    }

    /// Create a not-scheduled-for-update error
    pub fn not_scheduled_for_update(name: impl Into<String>) -> Self {
        Self::NotScheduledForUpdate { name: name.into() }
    }

    /// Create an incompatibility error from a list of reasons
    pub fn incompatible(name: impl Into<String>, reasons: Vec<String>) -> Self {
        Self::Incompatible {
            name: name.into(),
            reasons: reasons.join("; "),
        }
    }

    /// Create an unusable-install-root error
    pub fn install_root_unavailable(
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InstallRootUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an empty-archive error
    pub fn empty_archive(path: impl Into<String>) -> Self {
        Self::EmptyArchive { path: path.into() }
    }

    /// Create an invalid-archive-layout error
    pub fn invalid_archive_layout(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArchiveLayout {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an invalid-descriptor error
    pub fn invalid_descriptor(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            path: path.into(),
            message: message.into(),
        }
    }
}
