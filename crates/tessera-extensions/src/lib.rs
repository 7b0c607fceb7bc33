//! Extension management for Tessera
//!
//! This crate handles:
//! - The installed-extension registry and its lifecycle operations
//! - `.s4ext` description file parsing and writing
//! - Archive extraction behind pluggable extractor/layout seams
//! - Search-path bookkeeping in the application settings
//! - Remote catalog metadata retrieval and update scheduling
//! - Lifecycle notifications through registry observers

pub mod archive;
pub mod catalog;
pub mod descriptor;
pub mod events;
pub mod paths;
pub mod registry;

pub use archive::{ArchiveExtractor, ArchiveLayout, BundleLayout, FlatLayout, TarGzExtractor};
pub use catalog::{CatalogClient, ServerApi};
pub use descriptor::ExtensionDescription;
pub use events::RegistryObserver;
pub use paths::SearchPathLayout;
pub use registry::{ExtensionRegistry, MetadataSource, SweepOutcome};
