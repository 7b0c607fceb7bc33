//! Key vocabulary shared by the descriptor format and the settings store
//!
//! The descriptor keys are the historical on-disk vocabulary of the `.s4ext`
//! format and must not be renamed: installed description files written by
//! earlier releases of the application use exactly these spellings.

/// Extension name. Derived from the descriptor file name, never written.
pub const KEY_NAME: &str = "extensionname";
/// Source-control system ("git", "svn", or "NA")
pub const KEY_SCM: &str = "scm";
/// Source repository URL
pub const KEY_SCM_URL: &str = "scmurl";
/// Extension source revision
pub const KEY_REVISION: &str = "revision";
/// Application revision the extension was built against.
/// The key spelling is part of the descriptor format.
pub const KEY_APP_REVISION: &str = "slicer_revision";
/// Release identifier, if any
pub const KEY_RELEASE: &str = "release";
/// Target architecture
pub const KEY_ARCH: &str = "arch";
/// Target operating system
pub const KEY_OS: &str = "os";
/// Dependencies, space separated, "NA" for none
pub const KEY_DEPENDS: &str = "depends";
/// Homepage URL
pub const KEY_HOMEPAGE: &str = "homepage";
/// Icon URL
pub const KEY_ICON_URL: &str = "iconurl";
/// Category shown in the manager UI
pub const KEY_CATEGORY: &str = "category";
/// Status string reported by the build system
pub const KEY_STATUS: &str = "status";
/// Contributors, comma separated
pub const KEY_CONTRIBUTORS: &str = "contributors";
/// Free-form description
pub const KEY_DESCRIPTION: &str = "description";
/// Screenshot URLs, space separated
pub const KEY_SCREENSHOTS: &str = "screenshots";
/// Whether the extension participates in the search paths
pub const KEY_ENABLED: &str = "enabled";
/// Name of the archive the extension was installed from
pub const KEY_ARCHIVE_NAME: &str = "archivename";
/// Archive checksum
pub const KEY_MD5: &str = "md5";
/// Whether the extension files are present on disk
pub const KEY_INSTALLED: &str = "installed";
/// Server-side last-update timestamp
pub const KEY_UPDATED: &str = "updated";
/// Bookmark flag. Kept in settings, never written to descriptors.
pub const KEY_BOOKMARKED: &str = "bookmarked";
/// Loaded flag. Transient, never written to descriptors.
pub const KEY_LOADED: &str = "loaded";
/// Server-assigned identifier
pub const KEY_EXTENSION_ID: &str = "extension_id";

/// Keys never emitted by the descriptor writer
pub const KEYS_NOT_WRITTEN: [&str; 3] = [KEY_NAME, KEY_BOOKMARKED, KEY_LOADED];

/// Placeholder value used where the build system had nothing to report
pub const VALUE_NA: &str = "NA";

// Settings keys. The `Section/Key` addressing mirrors the application's
// settings file; see `SettingsStore` for how it maps onto the TOML document.

pub const SETTINGS_SERVER_URL: &str = "Extensions/ServerUrl";
pub const SETTINGS_INSTALL_PATH: &str = "Extensions/InstallPath";
pub const SETTINGS_SCHEDULED_FOR_UNINSTALL: &str = "Extensions/ScheduledForUninstall";
pub const SETTINGS_SCHEDULED_FOR_UPDATE: &str = "Extensions/ScheduledForUpdate";
pub const SETTINGS_BOOKMARKED: &str = "Extensions/Bookmarked";
pub const SETTINGS_AUTO_UPDATE_CHECK: &str = "Extensions/AutoUpdateCheck";
pub const SETTINGS_AUTO_UPDATE_FREQUENCY_MINUTES: &str = "Extensions/AutoUpdateFrequencyMinutes";
pub const SETTINGS_METADATA_UPDATE_TIME: &str = "Extensions/MetadataFromServerUpdateTime";
pub const SETTINGS_METADATA_SERVER_URL: &str = "Extensions/MetadataFromServerUrl";
pub const SETTINGS_ADDITIONAL_MODULE_PATHS: &str = "Modules/AdditionalPaths";
pub const SETTINGS_APP_REVISION: &str = "App/Revision";

/// Indexed-array settings sections; each stores a list of paths under the
/// given field name.
pub const ARRAY_LIBRARY_PATHS: &str = "LibraryPaths";
pub const ARRAY_PATHS: &str = "Paths";
pub const ARRAY_PYTHONPATH: &str = "PYTHONPATH";
/// Field name used inside the indexed-array sections
pub const ARRAY_FIELD_PATH: &str = "path";
