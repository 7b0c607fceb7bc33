//! Core library for Tessera
//!
//! Shared building blocks used by the extension registry and the CLI:
//! - Error types ([`error`])
//! - Descriptor and settings key vocabulary ([`keys`])
//! - Extension metadata and application requirements ([`types`])
//! - The persisted settings store abstraction ([`settings`])

pub mod error;
pub mod keys;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use settings::{MemorySettings, SettingsStore, TomlSettings};
pub use types::{string_to_bool, ExtensionMetadata, Requirements};
