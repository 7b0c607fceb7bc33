//! Installed-extension registry
//!
//! [`ExtensionRegistry`] owns the authoritative table of managed extensions:
//! everything installed under the install root plus bookmarked extensions
//! that are not currently on disk. All lifecycle operations go through it so
//! that the description files, the search paths in settings, and the
//! in-memory table never disagree.
//!
//! Collaborators are injected: the settings store, the archive extractor,
//! and the archive layout are traits, and lifecycle notifications go out
//! through subscribed [`RegistryObserver`]s, synchronously and in
//! subscription order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tessera_core::keys::*;
use tessera_core::types::bool_to_string;
use tessera_core::{Error, ExtensionMetadata, Requirements, SettingsStore};

use crate::archive::{install_archive_payload, ArchiveExtractor, ArchiveLayout, FlatLayout, TarGzExtractor};
use crate::descriptor::{scan_install_root, ExtensionDescription, DESCRIPTION_FILE_EXTENSION};
use crate::events::RegistryObserver;
use crate::paths::{append_to_path_list, remove_from_path_list, SearchPathLayout};

/// Cache file for catalog metadata, kept under the install root
pub const SERVER_METADATA_CACHE_FILE: &str = "ExtensionsMetadataFromServer.json";
/// Staging directory for scheduled updates, kept under the install root
pub const UPDATE_STAGING_DIR: &str = ".updates";
/// Default catalog refresh interval when settings carry none
const DEFAULT_AUTO_UPDATE_FREQUENCY_MINUTES: i64 = 1440;

/// Which metadata to return from [`ExtensionRegistry::extension_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// Server metadata overlaid by the locally installed descriptor
    All,
    /// Only the locally installed descriptor
    Local,
    /// Only the cached catalog metadata
    Server,
}

/// Result of a continue-on-failure sweep (scheduled uninstalls or updates).
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Extensions processed successfully
    pub completed: Vec<String>,
    /// Extensions that failed, with the failure message
    pub failed: Vec<(String, String)>,
}

impl SweepOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The registry of managed extensions.
pub struct ExtensionRegistry {
    settings: Box<dyn SettingsStore>,
    extractor: Box<dyn ArchiveExtractor>,
    layout: Box<dyn ArchiveLayout>,
    search_paths: SearchPathLayout,
    observers: Vec<Box<dyn RegistryObserver>>,
    requirements: Requirements,
    new_extension_enabled_by_default: bool,
    extensions: BTreeMap<String, ExtensionDescription>,
    server_metadata: BTreeMap<String, ExtensionMetadata>,
    available_updates: BTreeMap<String, String>,
    loaded: BTreeSet<String>,
}

impl ExtensionRegistry {
    /// Create a registry over the given settings store with the default
    /// tar.gz extractor and flat archive layout.
    pub fn new(settings: Box<dyn SettingsStore>, requirements: Requirements) -> Self {
        Self {
            settings,
            extractor: Box::new(TarGzExtractor),
            layout: Box::new(FlatLayout),
            search_paths: SearchPathLayout::default(),
            observers: Vec::new(),
            requirements,
            new_extension_enabled_by_default: true,
            extensions: BTreeMap::new(),
            server_metadata: BTreeMap::new(),
            available_updates: BTreeMap::new(),
            loaded: BTreeSet::new(),
        }
    }

    /// Replace the archive extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the archive layout strategy.
    pub fn with_layout(mut self, layout: Box<dyn ArchiveLayout>) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the search-path layout.
    pub fn with_search_paths(mut self, search_paths: SearchPathLayout) -> Self {
        self.search_paths = search_paths;
        self
    }

    /// Subscribe a lifecycle observer. Observers are invoked synchronously
    /// in subscription order.
    pub fn subscribe(&mut self, observer: Box<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    /// Whether freshly installed extensions start enabled.
    pub fn set_new_extension_enabled_by_default(&mut self, enabled: bool) {
        self.new_extension_enabled_by_default = enabled;
    }

    pub fn new_extension_enabled_by_default(&self) -> bool {
        self.new_extension_enabled_by_default
    }

    fn notify(&self, f: impl Fn(&dyn RegistryObserver)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }

    /// The injected settings store.
    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        self.settings.as_mut()
    }

    // ── Settings access ────────────────────────────────────────────────

    fn ensure_settings_writable(&self) -> Result<()> {
        if self.settings.is_writable() {
            Ok(())
        } else {
            Err(Error::SettingsNotWritable.into())
        }
    }

    /// Configured install root; error if not set.
    pub fn install_root(&self) -> Result<PathBuf> {
        match self.settings.get_string(SETTINGS_INSTALL_PATH)? {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Err(Error::InstallRootNotSet.into()),
        }
    }

    /// Persist the install root.
    pub fn set_install_root(&mut self, path: &Path) -> Result<()> {
        self.ensure_settings_writable()?;
        self.settings
            .set_string(SETTINGS_INSTALL_PATH, &path.display().to_string())?;
        Ok(())
    }

    /// Configured extensions server URL, if any.
    pub fn server_url(&self) -> Result<Option<String>> {
        Ok(self.settings.get_string(SETTINGS_SERVER_URL)?)
    }

    pub fn set_server_url(&mut self, url: &str) -> Result<()> {
        self.ensure_settings_writable()?;
        self.settings.set_string(SETTINGS_SERVER_URL, url)?;
        Ok(())
    }

    /// Directory holding an installed extension's files.
    pub fn extension_dir(&self, name: &str) -> Result<PathBuf> {
        Ok(self.install_root()?.join(name))
    }

    /// Path of an extension's description file.
    pub fn description_file_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self
            .install_root()?
            .join(format!("{name}.{DESCRIPTION_FILE_EXTENSION}")))
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    /// Change the application requirements triple. Notifies only on actual
    /// change.
    pub fn set_requirements(&mut self, requirements: Requirements) {
        if self.requirements == requirements {
            return;
        }
        self.requirements = requirements;
        self.notify(|o| o.on_requirements_changed());
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.settings.get_string_list(key)?)
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        self.settings.set_string_list(key, values)?;
        Ok(())
    }

    // ── Model ──────────────────────────────────────────────────────────

    /// Rebuild the in-memory table from the description files on disk.
    ///
    /// Description files that are neither installed nor bookmarked are
    /// removed; bookmarked extensions with no file on disk are kept in the
    /// table using cached catalog metadata. Safe to call with no install
    /// root configured.
    pub fn update_model(&mut self) -> Result<()> {
        let bookmarks: BTreeSet<String> =
            self.string_list(SETTINGS_BOOKMARKED)?.into_iter().collect();

        let mut table = BTreeMap::new();
        if let Ok(root) = self.install_root() {
            for file in scan_install_root(&root)? {
                let mut description = match ExtensionDescription::parse_file(&file) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!("Skipping unreadable description file {}: {e}", file.display());
                        continue;
                    }
                };
                let bookmarked = bookmarks.contains(&description.name);
                if !description.flag(KEY_INSTALLED) && !bookmarked {
                    debug!(
                        "Dropping stale description file {} (not installed, not bookmarked)",
                        file.display()
                    );
                    std::fs::remove_file(&file)
                        .with_context(|| format!("Failed to remove {}", file.display()))?;
                    continue;
                }
                description.metadata.insert(
                    KEY_BOOKMARKED.to_string(),
                    bool_to_string(bookmarked).to_string(),
                );
                table.insert(description.name.clone(), description);
            }
        }

        for name in &bookmarks {
            if table.contains_key(name) {
                continue;
            }
            let mut metadata = self.server_metadata.get(name).cloned().unwrap_or_default();
            metadata.insert(KEY_INSTALLED.to_string(), "false".to_string());
            metadata.insert(KEY_BOOKMARKED.to_string(), "true".to_string());
            table.insert(name.clone(), ExtensionDescription::new(name.clone(), metadata));
        }

        self.extensions = table;
        debug!("Extension model rebuilt: {} entries", self.extensions.len());
        self.notify(|o| o.on_model_updated());
        Ok(())
    }

    /// All managed extensions: installed plus bookmarked.
    pub fn managed_extensions(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    /// Installed extensions, alphabetically.
    pub fn installed_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .filter(|(_, d)| d.flag(KEY_INSTALLED))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn installed_extension_count(&self) -> usize {
        self.installed_extensions().len()
    }

    /// Installed extensions that are enabled, alphabetically.
    pub fn enabled_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .filter(|(_, d)| d.flag(KEY_INSTALLED) && d.flag(KEY_ENABLED))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn bookmarked_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .filter(|(_, d)| d.flag(KEY_BOOKMARKED))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_extension_installed(&self, name: &str) -> bool {
        self.extensions
            .get(name)
            .map(|d| d.flag(KEY_INSTALLED))
            .unwrap_or(false)
    }

    pub fn is_extension_enabled(&self, name: &str) -> bool {
        self.extensions
            .get(name)
            .map(|d| d.flag(KEY_INSTALLED) && d.flag(KEY_ENABLED))
            .unwrap_or(false)
    }

    pub fn is_extension_bookmarked(&self, name: &str) -> bool {
        self.extensions
            .get(name)
            .map(|d| d.flag(KEY_BOOKMARKED))
            .unwrap_or(false)
    }

    pub fn is_extension_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Record the extensions the application has loaded into its process.
    /// Loaded extensions cannot be uninstalled directly.
    pub fn mark_extensions_loaded(&mut self, names: &[String]) {
        for name in names {
            self.loaded.insert(name.clone());
        }
    }

    /// Metadata for an extension, from the requested source.
    pub fn extension_metadata(&self, name: &str, source: MetadataSource) -> ExtensionMetadata {
        let local = || {
            self.extensions
                .get(name)
                .map(|d| d.metadata.clone())
                .unwrap_or_default()
        };
        let server = || self.server_metadata.get(name).cloned().unwrap_or_default();
        match source {
            MetadataSource::Local => local(),
            MetadataSource::Server => server(),
            MetadataSource::All => {
                // Local fields win over catalog fields
                let mut merged = server();
                merged.extend(local());
                merged
            }
        }
    }

    // ── Compatibility ──────────────────────────────────────────────────

    /// Human-readable reasons the metadata is incompatible with the triple;
    /// empty means compatible. An unspecified triple component is itself a
    /// reason and is reported without consulting the metadata.
    pub fn compatibility_reasons(
        metadata: &ExtensionMetadata,
        requirements: &Requirements,
    ) -> Vec<String> {
        let mut reasons = Vec::new();
        if requirements.revision.is_empty() {
            reasons.push("application revision is not specified".to_string());
        }
        if requirements.os.is_empty() {
            reasons.push("application operating system is not specified".to_string());
        }
        if requirements.arch.is_empty() {
            reasons.push("application architecture is not specified".to_string());
        }
        if !reasons.is_empty() {
            return reasons;
        }

        let get = |key: &str| metadata.get(key).map(String::as_str).unwrap_or("");
        let extension_revision = get(KEY_APP_REVISION);
        if !extension_revision.is_empty() && extension_revision != requirements.revision {
            reasons.push(format!(
                "extension is built for application revision {extension_revision}, current is {}",
                requirements.revision
            ));
        }
        let extension_os = get(KEY_OS);
        if !extension_os.is_empty() && extension_os != requirements.os {
            reasons.push(format!(
                "extension is built for {extension_os}, current operating system is {}",
                requirements.os
            ));
        }
        let extension_arch = get(KEY_ARCH);
        if !extension_arch.is_empty() && extension_arch != requirements.arch {
            reasons.push(format!(
                "extension is built for {extension_arch}, current architecture is {}",
                requirements.arch
            ));
        }
        reasons
    }

    /// Compatibility of a managed extension against the current triple.
    pub fn is_extension_compatible(&self, name: &str) -> Vec<String> {
        let metadata = self.extension_metadata(name, MetadataSource::All);
        Self::compatibility_reasons(&metadata, &self.requirements)
    }

    // ── Search paths ───────────────────────────────────────────────────

    fn add_search_paths(&mut self, name: &str) -> Result<()> {
        let dir = self.extension_dir(name)?;

        let modules = self.string_list(SETTINGS_ADDITIONAL_MODULE_PATHS)?;
        let modules = append_to_path_list(modules, self.search_paths.module_paths(&dir));
        self.set_string_list(SETTINGS_ADDITIONAL_MODULE_PATHS, &modules)?;

        let libraries = self.settings.read_array_values(ARRAY_LIBRARY_PATHS, ARRAY_FIELD_PATH)?;
        let libraries = append_to_path_list(libraries, self.search_paths.library_paths(&dir));
        self.settings
            .write_array_values(ARRAY_LIBRARY_PATHS, ARRAY_FIELD_PATH, &libraries)?;

        let bins = self.settings.read_array_values(ARRAY_PATHS, ARRAY_FIELD_PATH)?;
        let bins = append_to_path_list(bins, self.search_paths.bin_paths(&dir));
        self.settings
            .write_array_values(ARRAY_PATHS, ARRAY_FIELD_PATH, &bins)?;

        let python = self.settings.read_array_values(ARRAY_PYTHONPATH, ARRAY_FIELD_PATH)?;
        let python = append_to_path_list(python, self.search_paths.python_paths(&dir));
        self.settings
            .write_array_values(ARRAY_PYTHONPATH, ARRAY_FIELD_PATH, &python)?;
        Ok(())
    }

    fn remove_search_paths(&mut self, name: &str) -> Result<()> {
        let dir = self.extension_dir(name)?;

        let modules = self.string_list(SETTINGS_ADDITIONAL_MODULE_PATHS)?;
        let modules = remove_from_path_list(modules, self.search_paths.module_paths(&dir));
        self.set_string_list(SETTINGS_ADDITIONAL_MODULE_PATHS, &modules)?;

        let libraries = self.settings.read_array_values(ARRAY_LIBRARY_PATHS, ARRAY_FIELD_PATH)?;
        let libraries = remove_from_path_list(libraries, self.search_paths.library_paths(&dir));
        self.settings
            .write_array_values(ARRAY_LIBRARY_PATHS, ARRAY_FIELD_PATH, &libraries)?;

        let bins = self.settings.read_array_values(ARRAY_PATHS, ARRAY_FIELD_PATH)?;
        let bins = remove_from_path_list(bins, self.search_paths.bin_paths(&dir));
        self.settings
            .write_array_values(ARRAY_PATHS, ARRAY_FIELD_PATH, &bins)?;

        let python = self.settings.read_array_values(ARRAY_PYTHONPATH, ARRAY_FIELD_PATH)?;
        let python = remove_from_path_list(python, self.search_paths.python_paths(&dir));
        self.settings
            .write_array_values(ARRAY_PYTHONPATH, ARRAY_FIELD_PATH, &python)?;
        Ok(())
    }

    // ── Install ────────────────────────────────────────────────────────

    /// Everything install requires before it touches the filesystem.
    pub fn check_install_prerequisites(&self) -> Result<()> {
        self.ensure_settings_writable()?;
        let root = self.install_root()?;
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::install_root_unavailable(root.display().to_string(), e.to_string())
        })?;
        Ok(())
    }

    /// Install an extension from an archive.
    ///
    /// Precondition failures (empty name, already installed, unusable
    /// install root, unwritable settings) leave no trace on disk and emit no
    /// notification. When `metadata` is empty, the description file bundled
    /// in the archive payload seeds the descriptor.
    pub fn install_extension(
        &mut self,
        name: &str,
        metadata: ExtensionMetadata,
        archive: &Path,
    ) -> Result<()> {
        self.install_core(name, metadata, archive)?;
        info!("Installed extension '{name}'");
        self.notify(|o| o.on_extension_installed(name));
        Ok(())
    }

    fn install_core(
        &mut self,
        name: &str,
        metadata: ExtensionMetadata,
        archive: &Path,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyExtensionName.into());
        }
        if self.is_extension_installed(name) {
            return Err(Error::already_installed(name).into());
        }
        self.check_install_prerequisites()?;
        let root = self.install_root()?;

        install_archive_payload(
            self.extractor.as_ref(),
            self.layout.as_ref(),
            name,
            archive,
            &root,
            &self.requirements,
        )?;

        let mut description = ExtensionDescription::new(name, metadata);
        if description.metadata.is_empty() {
            if let Some(bundled) = self.find_payload_descriptor(name)? {
                for (key, value) in bundled.metadata {
                    description.set_if_empty(&key, value);
                }
            }
        }

        description.set_if_empty(KEY_SCM, VALUE_NA);
        description.set_if_empty(KEY_SCM_URL, VALUE_NA);
        description.set_if_empty(KEY_REVISION, VALUE_NA);
        description.set_if_empty(KEY_APP_REVISION, self.requirements.revision.clone());
        description.set_if_empty(KEY_OS, self.requirements.os.clone());
        description.set_if_empty(KEY_ARCH, self.requirements.arch.clone());
        if let Some(file_name) = archive.file_name() {
            description.set(KEY_ARCHIVE_NAME, file_name.to_string_lossy().into_owned());
        }
        description.set_flag(KEY_INSTALLED, true);
        description.set_if_empty(
            KEY_ENABLED,
            bool_to_string(self.new_extension_enabled_by_default),
        );
        description.metadata.insert(
            KEY_BOOKMARKED.to_string(),
            bool_to_string(self.is_extension_bookmarked(name)).to_string(),
        );

        description.write_file(&self.description_file_path(name)?)?;
        if description.flag(KEY_ENABLED) {
            self.add_search_paths(name)?;
        }
        self.extensions.insert(name.to_string(), description);
        Ok(())
    }

    /// Description file bundled inside an installed extension's payload,
    /// written there by the build system.
    fn find_payload_descriptor(&self, name: &str) -> Result<Option<ExtensionDescription>> {
        let dir = self.extension_dir(name)?;
        let wanted = format!("{name}.{DESCRIPTION_FILE_EXTENSION}");
        for entry in walkdir::WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy() == wanted.as_str()
            {
                return Ok(Some(ExtensionDescription::parse_file(entry.path())?));
            }
        }
        Ok(None)
    }

    // ── Uninstall ──────────────────────────────────────────────────────

    /// Schedule an installed extension for removal at the next sweep and
    /// take its directories out of the search paths right away. Scheduling
    /// twice is a no-op.
    pub fn schedule_extension_for_uninstall(&mut self, name: &str) -> Result<()> {
        if !self.is_extension_installed(name) {
            return Err(Error::not_installed(name).into());
        }
        self.ensure_settings_writable()?;
        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL)?;
        if scheduled.iter().any(|n| n == name) {
            return Ok(());
        }
        self.remove_search_paths(name)?;
        scheduled.push(name.to_string());
        self.set_string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL, &scheduled)?;
        self.notify(|o| o.on_scheduled_for_uninstall(name));
        Ok(())
    }

    /// Cancel a scheduled removal, restoring the search paths of an enabled
    /// extension.
    pub fn cancel_extension_scheduled_for_uninstall(&mut self, name: &str) -> Result<()> {
        self.ensure_settings_writable()?;
        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL)?;
        let before = scheduled.len();
        scheduled.retain(|n| n != name);
        if scheduled.len() == before {
            return Err(Error::not_scheduled_for_uninstall(name).into());
        }
        self.set_string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL, &scheduled)?;
        if self.is_extension_enabled(name) {
            self.add_search_paths(name)?;
        }
        self.notify(|o| o.on_uninstall_schedule_cancelled(name));
        Ok(())
    }

    pub fn is_extension_scheduled_for_uninstall(&self, name: &str) -> Result<bool> {
        Ok(self
            .string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL)?
            .iter()
            .any(|n| n == name))
    }

    pub fn extensions_scheduled_for_uninstall(&self) -> Result<Vec<String>> {
        self.string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL)
    }

    /// Remove an installed extension immediately. Refused while the
    /// extension is loaded into the running application.
    pub fn uninstall_extension(&mut self, name: &str) -> Result<()> {
        if self.is_extension_loaded(name) {
            return Err(Error::extension_loaded(name).into());
        }
        self.uninstall_core(name)?;
        info!("Uninstalled extension '{name}'");
        self.notify(|o| o.on_extension_uninstalled(name));
        Ok(())
    }

    fn uninstall_core(&mut self, name: &str) -> Result<()> {
        if !self.is_extension_installed(name) {
            return Err(Error::not_installed(name).into());
        }
        self.ensure_settings_writable()?;

        self.remove_search_paths(name)?;

        let dir = self.extension_dir(name)?;
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }

        let descriptor_path = self.description_file_path(name)?;
        if self.is_extension_bookmarked(name) {
            // A bookmark keeps the extension in the table, just not on disk
            if let Some(description) = self.extensions.get_mut(name) {
                description.set_flag(KEY_INSTALLED, false);
                description.write_file(&descriptor_path)?;
            }
        } else {
            if descriptor_path.exists() {
                std::fs::remove_file(&descriptor_path).with_context(|| {
                    format!("Failed to remove {}", descriptor_path.display())
                })?;
            }
            self.extensions.remove(name);
        }

        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL)?;
        scheduled.retain(|n| n != name);
        self.set_string_list(SETTINGS_SCHEDULED_FOR_UNINSTALL, &scheduled)?;
        self.available_updates.remove(name);
        Ok(())
    }

    /// Remove every extension scheduled for uninstall, continuing past
    /// individual failures and reporting both outcomes.
    pub fn uninstall_scheduled_extensions(&mut self) -> Result<SweepOutcome> {
        let mut outcome = SweepOutcome::default();
        for name in self.extensions_scheduled_for_uninstall()? {
            match self.uninstall_extension(&name) {
                Ok(()) => outcome.completed.push(name),
                Err(e) => {
                    warn!("Failed to uninstall '{name}': {e:#}");
                    outcome.failed.push((name, format!("{e:#}")));
                }
            }
        }
        Ok(outcome)
    }

    // ── Enable / disable ───────────────────────────────────────────────

    /// Enable or disable an installed extension.
    ///
    /// Refused with no state change when the settings are unwritable, when
    /// the extension is scheduled for removal (in either direction), or when
    /// enabling an incompatible extension. A call that would not change the
    /// state emits no notification.
    pub fn set_extension_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.ensure_settings_writable()?;
        if !self.is_extension_installed(name) {
            return Err(Error::not_installed(name).into());
        }
        if self.is_extension_scheduled_for_uninstall(name)? {
            return Err(Error::scheduled_for_uninstall(name).into());
        }
        if enabled {
            let reasons = self.is_extension_compatible(name);
            if !reasons.is_empty() {
                return Err(Error::incompatible(name, reasons).into());
            }
        }
        if self.is_extension_enabled(name) == enabled {
            return Ok(());
        }

        if enabled {
            self.add_search_paths(name)?;
        } else {
            self.remove_search_paths(name)?;
        }

        let descriptor_path = self.description_file_path(name)?;
        if let Some(description) = self.extensions.get_mut(name) {
            description.set_flag(KEY_ENABLED, enabled);
            description.write_file(&descriptor_path)?;
        }
        self.notify(|o| o.on_enabled_changed(name, enabled));
        Ok(())
    }

    // ── Bookmarks ──────────────────────────────────────────────────────

    /// Bookmark or unbookmark an extension. Bookmarks live in settings and
    /// keep an uninstalled extension in the managed table. No notification
    /// when the state does not change.
    pub fn set_extension_bookmarked(&mut self, name: &str, bookmarked: bool) -> Result<()> {
        self.ensure_settings_writable()?;
        let mut bookmarks = self.string_list(SETTINGS_BOOKMARKED)?;
        let currently = bookmarks.iter().any(|n| n == name);
        if currently == bookmarked {
            return Ok(());
        }

        if bookmarked {
            bookmarks.push(name.to_string());
        } else {
            bookmarks.retain(|n| n != name);
        }
        self.set_string_list(SETTINGS_BOOKMARKED, &bookmarks)?;

        if bookmarked {
            let description = self.extensions.entry(name.to_string()).or_insert_with(|| {
                let mut metadata = self.server_metadata.get(name).cloned().unwrap_or_default();
                metadata.insert(KEY_INSTALLED.to_string(), "false".to_string());
                ExtensionDescription::new(name.to_string(), metadata)
            });
            description.set_flag(KEY_BOOKMARKED, true);
        } else if let Some(description) = self.extensions.get_mut(name) {
            description.set_flag(KEY_BOOKMARKED, false);
            if !description.flag(KEY_INSTALLED) {
                self.extensions.remove(name);
                if let Ok(path) = self.description_file_path(name) {
                    if path.exists() {
                        std::fs::remove_file(&path)
                            .with_context(|| format!("Failed to remove {}", path.display()))?;
                    }
                }
            }
        }
        self.notify(|o| o.on_bookmarked_changed(name, bookmarked));
        Ok(())
    }

    // ── Catalog metadata and updates ───────────────────────────────────

    /// Replace the cached catalog metadata, persist it under the install
    /// root, and stamp the refresh time in settings.
    pub fn apply_server_metadata(
        &mut self,
        metadata: BTreeMap<String, ExtensionMetadata>,
        server_url: Option<&str>,
    ) -> Result<()> {
        self.server_metadata = metadata;

        if let Ok(root) = self.install_root() {
            std::fs::create_dir_all(&root)?;
            let cache = root.join(SERVER_METADATA_CACHE_FILE);
            let rendered = serde_json::to_string_pretty(&self.server_metadata)?;
            std::fs::write(&cache, rendered)
                .with_context(|| format!("Failed to write {}", cache.display()))?;
        }

        self.settings
            .set_string(SETTINGS_METADATA_UPDATE_TIME, &Utc::now().to_rfc3339())?;
        if let Some(url) = server_url {
            self.settings.set_string(SETTINGS_METADATA_SERVER_URL, url)?;
        }
        info!("Applied catalog metadata for {} extensions", self.server_metadata.len());
        self.notify(|o| o.on_metadata_updated());
        Ok(())
    }

    /// Load the catalog metadata persisted by a previous session, if any.
    pub fn load_cached_server_metadata(&mut self) -> Result<()> {
        let Ok(root) = self.install_root() else {
            return Ok(());
        };
        let cache = root.join(SERVER_METADATA_CACHE_FILE);
        if !cache.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&cache)
            .with_context(|| format!("Failed to read {}", cache.display()))?;
        self.server_metadata = serde_json::from_str(&content)
            .with_context(|| format!("Invalid metadata cache {}", cache.display()))?;
        debug!(
            "Loaded cached catalog metadata for {} extensions",
            self.server_metadata.len()
        );
        Ok(())
    }

    /// Whether the catalog metadata is stale per the auto-update settings.
    pub fn is_metadata_refresh_due(&self) -> Result<bool> {
        let auto = self
            .settings
            .get_string(SETTINGS_AUTO_UPDATE_CHECK)?
            .map(|v| tessera_core::string_to_bool(&v))
            .unwrap_or(true);
        if !auto {
            return Ok(false);
        }
        let Some(stamp) = self.settings.get_string(SETTINGS_METADATA_UPDATE_TIME)? else {
            return Ok(true);
        };
        let Ok(last) = DateTime::parse_from_rfc3339(&stamp) else {
            return Ok(true);
        };
        let frequency = self
            .settings
            .get_string(SETTINGS_AUTO_UPDATE_FREQUENCY_MINUTES)?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_AUTO_UPDATE_FREQUENCY_MINUTES);
        let elapsed = Utc::now().signed_duration_since(last.with_timezone(&Utc));
        Ok(elapsed.num_minutes() >= frequency)
    }

    /// Compare installed revisions against the catalog and record which
    /// extensions have updates. Newly found updates are announced.
    pub fn check_for_updates(&mut self) -> Vec<String> {
        let mut announcements = Vec::new();
        for name in self.installed_extensions() {
            let Some(server) = self.server_metadata.get(&name) else {
                continue;
            };
            let server_revision = server.get(KEY_REVISION).map(String::as_str).unwrap_or("");
            if server_revision.is_empty() || server_revision == VALUE_NA {
                continue;
            }
            let installed_revision = self
                .extensions
                .get(&name)
                .map(|d| d.get(KEY_REVISION).to_string())
                .unwrap_or_default();
            if server_revision != installed_revision
                && self.available_updates.get(&name).map(String::as_str) != Some(server_revision)
            {
                self.available_updates
                    .insert(name.clone(), server_revision.to_string());
                announcements.push((name, installed_revision, server_revision.to_string()));
            }
        }
        for (name, installed, server) in &announcements {
            self.notify(|o| o.on_update_available(name, installed, server));
        }
        self.available_updates.keys().cloned().collect()
    }

    pub fn is_update_available(&self, name: &str) -> bool {
        self.available_updates.contains_key(name)
    }

    fn update_staging_dir(&self) -> Result<PathBuf> {
        Ok(self.install_root()?.join(UPDATE_STAGING_DIR))
    }

    /// Stage an update archive for an installed extension; the swap happens
    /// at the next [`Self::update_scheduled_extensions`] sweep.
    pub fn schedule_extension_for_update(&mut self, name: &str, archive: &Path) -> Result<()> {
        if !self.is_extension_installed(name) {
            return Err(Error::not_installed(name).into());
        }
        self.ensure_settings_writable()?;
        if self.is_extension_scheduled_for_uninstall(name)? {
            return Err(Error::scheduled_for_uninstall(name).into());
        }

        let staging = self.update_staging_dir()?;
        std::fs::create_dir_all(&staging)?;
        let archive_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{name}.tar.gz"));
        std::fs::copy(archive, staging.join(&archive_name))
            .with_context(|| format!("Failed to stage {}", archive.display()))?;

        // Staged descriptor: the installed fields refreshed by the catalog
        let mut metadata = self.extension_metadata(name, MetadataSource::Local);
        for (key, value) in self.extension_metadata(name, MetadataSource::Server) {
            metadata.insert(key, value);
        }
        let mut staged = ExtensionDescription::new(name, metadata);
        staged.set(KEY_ARCHIVE_NAME, archive_name);
        staged.set_flag(KEY_INSTALLED, true);
        staged.write_file(&staging.join(format!("{name}.{DESCRIPTION_FILE_EXTENSION}")))?;

        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UPDATE)?;
        if !scheduled.iter().any(|n| n == name) {
            scheduled.push(name.to_string());
            self.set_string_list(SETTINGS_SCHEDULED_FOR_UPDATE, &scheduled)?;
            self.notify(|o| o.on_scheduled_for_update(name));
        }
        Ok(())
    }

    /// Drop a staged update.
    pub fn cancel_extension_scheduled_for_update(&mut self, name: &str) -> Result<()> {
        self.ensure_settings_writable()?;
        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UPDATE)?;
        let before = scheduled.len();
        scheduled.retain(|n| n != name);
        if scheduled.len() == before {
            return Err(Error::not_scheduled_for_update(name).into());
        }
        self.set_string_list(SETTINGS_SCHEDULED_FOR_UPDATE, &scheduled)?;
        self.remove_staged_update(name)?;
        self.notify(|o| o.on_update_schedule_cancelled(name));
        Ok(())
    }

    pub fn is_extension_scheduled_for_update(&self, name: &str) -> Result<bool> {
        Ok(self
            .string_list(SETTINGS_SCHEDULED_FOR_UPDATE)?
            .iter()
            .any(|n| n == name))
    }

    pub fn extensions_scheduled_for_update(&self) -> Result<Vec<String>> {
        self.string_list(SETTINGS_SCHEDULED_FOR_UPDATE)
    }

    fn remove_staged_update(&self, name: &str) -> Result<()> {
        let staging = self.update_staging_dir()?;
        let descriptor = staging.join(format!("{name}.{DESCRIPTION_FILE_EXTENSION}"));
        if descriptor.exists() {
            let staged = ExtensionDescription::parse_file(&descriptor)?;
            let archive = staging.join(staged.get(KEY_ARCHIVE_NAME));
            if archive.is_file() {
                std::fs::remove_file(&archive)?;
            }
            std::fs::remove_file(&descriptor)?;
        }
        Ok(())
    }

    fn apply_staged_update(&mut self, name: &str) -> Result<()> {
        if self.is_extension_loaded(name) {
            return Err(Error::extension_loaded(name).into());
        }
        let staging = self.update_staging_dir()?;
        let descriptor = staging.join(format!("{name}.{DESCRIPTION_FILE_EXTENSION}"));
        let staged = ExtensionDescription::parse_file(&descriptor)
            .with_context(|| format!("No staged update for '{name}'"))?;
        let archive = staging.join(staged.get(KEY_ARCHIVE_NAME));

        let was_bookmarked = self.is_extension_bookmarked(name);
        self.uninstall_core(name)?;
        // Bookmarked rows survive uninstall_core with installed=false; a
        // leftover row would make install_core bail, so clear it.
        if was_bookmarked {
            self.extensions.remove(name);
        }
        self.install_core(name, staged.metadata.clone(), &archive)?;

        self.remove_staged_update(name)?;
        let mut scheduled = self.string_list(SETTINGS_SCHEDULED_FOR_UPDATE)?;
        scheduled.retain(|n| n != name);
        self.set_string_list(SETTINGS_SCHEDULED_FOR_UPDATE, &scheduled)?;
        self.available_updates.remove(name);
        Ok(())
    }

    /// Swap in every staged update, continuing past individual failures.
    pub fn update_scheduled_extensions(&mut self) -> Result<SweepOutcome> {
        let mut outcome = SweepOutcome::default();
        for name in self.extensions_scheduled_for_update()? {
            match self.apply_staged_update(&name) {
                Ok(()) => {
                    info!("Updated extension '{name}'");
                    self.notify(|o| o.on_extension_updated(&name));
                    outcome.completed.push(name);
                }
                Err(e) => {
                    warn!("Failed to update '{name}': {e:#}");
                    outcome.failed.push((name, format!("{e:#}")));
                }
            }
        }
        Ok(outcome)
    }

    // ── Dependencies ───────────────────────────────────────────────────

    /// Walk the `depends` fields of the given extensions and split the
    /// not-yet-installed dependencies into those the catalog knows about
    /// and those it does not. Downloading is the caller's business.
    pub fn dependencies_to_install(&self, names: &[String]) -> (Vec<String>, Vec<String>) {
        let mut queue: Vec<String> = names.to_vec();
        let mut seen = BTreeSet::new();
        let mut resolvable = BTreeSet::new();
        let mut unresolved = BTreeSet::new();

        while let Some(name) = queue.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let metadata = self.extension_metadata(&name, MetadataSource::All);
            let depends = metadata.get(KEY_DEPENDS).map(String::as_str).unwrap_or("");
            for dependency in depends.split_whitespace() {
                if dependency == VALUE_NA || self.is_extension_installed(dependency) {
                    continue;
                }
                if self.server_metadata.contains_key(dependency) {
                    resolvable.insert(dependency.to_string());
                    queue.push(dependency.to_string());
                } else {
                    unresolved.insert(dependency.to_string());
                }
            }
        }
        (
            resolvable.into_iter().collect(),
            unresolved.into_iter().collect(),
        )
    }

    // ── Export ─────────────────────────────────────────────────────────

    /// Write the managed extensions and their metadata as a JSON document.
    pub fn export_extension_list(&self, path: &Path) -> Result<()> {
        let mut entries = Vec::new();
        for (name, description) in &self.extensions {
            let mut entry = serde_json::Map::new();
            entry.insert(KEY_NAME.to_string(), serde_json::Value::String(name.clone()));
            for (key, value) in &description.metadata {
                entry.insert(key.clone(), serde_json::Value::String(value.clone()));
            }
            entries.push(serde_json::Value::Object(entry));
        }
        let rendered = serde_json::to_string_pretty(&serde_json::Value::Array(entries))?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Exported {} extensions to {}", self.extensions.len(), path.display());
        Ok(())
    }
}
