//! Filesystem fixtures: temp install roots and real .tar.gz archives

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use tessera_core::keys::SETTINGS_INSTALL_PATH;
use tessera_core::{MemorySettings, SettingsStore};
use tessera_extensions::ExtensionRegistry;

use super::builders::test_requirements;

/// A temp directory with an install root and a place for built archives.
pub struct TestEnv {
    root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        std::fs::create_dir(root.path().join("extensions")).unwrap();
        std::fs::create_dir(root.path().join("archives")).unwrap();
        Self { root }
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root.path().join("extensions")
    }

    /// Build a real extension archive with the conventional payload tree:
    /// module/library/bin/python directories plus the bundled description
    /// file at `share/<name>/<name>.s4ext`.
    pub fn build_archive(&self, name: &str, revision: &str) -> PathBuf {
        let top_level = format!("{name}-{revision}");
        let source = self.root.path().join("archive-src").join(&top_level);
        for subdir in ["lib/modules", "lib/python", "bin"] {
            std::fs::create_dir_all(source.join(subdir)).unwrap();
        }
        std::fs::write(source.join("lib/modules/module.txt"), "module").unwrap();
        std::fs::write(source.join("lib/runtime.so"), "library").unwrap();
        std::fs::write(source.join("bin/tool"), "binary").unwrap();
        std::fs::write(source.join("lib/python/pkg.py"), "python").unwrap();

        let share = source.join("share").join(name);
        std::fs::create_dir_all(&share).unwrap();
        std::fs::write(
            share.join(format!("{name}.s4ext")),
            format!("category Imaging\ndescription Bundled description of {name}\nrevision {revision}\n"),
        )
        .unwrap();

        let archive = self
            .root
            .path()
            .join("archives")
            .join(format!("{top_level}.tar.gz"));
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder
            .append_dir_all(&top_level, &source)
            .expect("append archive content");
        builder.into_inner().unwrap().finish().unwrap();
        std::fs::remove_dir_all(source.parent().unwrap()).ok();
        archive
    }

    /// Module search path an installed extension contributes.
    pub fn module_path(&self, name: &str) -> String {
        self.install_dir()
            .join(name)
            .join("lib/modules")
            .display()
            .to_string()
    }

    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.install_dir().join(format!("{name}.s4ext"))
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry over in-memory settings pointed at the env's install root.
pub fn make_registry(env: &TestEnv) -> ExtensionRegistry {
    let mut settings = MemorySettings::new();
    settings
        .set_string(
            SETTINGS_INSTALL_PATH,
            &env.install_dir().display().to_string(),
        )
        .unwrap();
    ExtensionRegistry::new(Box::new(settings), test_requirements())
}

/// Current Modules/AdditionalPaths list of a registry.
pub fn module_paths(registry: &ExtensionRegistry) -> Vec<String> {
    registry
        .settings()
        .get_string_list(tessera_core::keys::SETTINGS_ADDITIONAL_MODULE_PATHS)
        .unwrap()
}

/// Current library-path array of a registry.
pub fn library_paths(registry: &ExtensionRegistry) -> Vec<String> {
    registry
        .settings()
        .read_array_values(
            tessera_core::keys::ARRAY_LIBRARY_PATHS,
            tessera_core::keys::ARRAY_FIELD_PATH,
        )
        .unwrap()
}

/// Assert a path is absent: used for checking cleanup contracts.
pub fn assert_absent(path: &Path) {
    assert!(
        !path.exists(),
        "expected {} to be absent",
        path.display()
    );
}

/// Settings store whose writability can be flipped from outside the
/// registry, to exercise unwritable-settings refusals mid-test.
pub struct ToggleableSettings {
    inner: MemorySettings,
    writable: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl ToggleableSettings {
    pub fn new() -> (Self, std::sync::Arc<std::sync::atomic::AtomicBool>) {
        let writable = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        (
            Self {
                inner: MemorySettings::new(),
                writable: writable.clone(),
            },
            writable,
        )
    }

    fn check(&self) -> tessera_core::Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(tessera_core::Error::SettingsNotWritable)
        }
    }
}

impl SettingsStore for ToggleableSettings {
    fn get_string(&self, key: &str) -> tessera_core::Result<Option<String>> {
        self.inner.get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) -> tessera_core::Result<()> {
        self.check()?;
        self.inner.set_string(key, value)
    }

    fn get_string_list(&self, key: &str) -> tessera_core::Result<Vec<String>> {
        self.inner.get_string_list(key)
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) -> tessera_core::Result<()> {
        self.check()?;
        self.inner.set_string_list(key, values)
    }

    fn remove(&mut self, key: &str) -> tessera_core::Result<()> {
        self.check()?;
        self.inner.remove(key)
    }

    fn read_array_values(&self, array: &str, field: &str) -> tessera_core::Result<Vec<String>> {
        self.inner.read_array_values(array, field)
    }

    fn write_array_values(
        &mut self,
        array: &str,
        field: &str,
        values: &[String],
    ) -> tessera_core::Result<()> {
        self.check()?;
        self.inner.write_array_values(array, field, values)
    }

    fn is_writable(&self) -> bool {
        self.writable.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Registry over toggleable settings, returning the writability handle.
pub fn make_toggleable_registry(
    env: &TestEnv,
) -> (
    ExtensionRegistry,
    std::sync::Arc<std::sync::atomic::AtomicBool>,
) {
    let (mut settings, writable) = ToggleableSettings::new();
    settings
        .set_string(
            SETTINGS_INSTALL_PATH,
            &env.install_dir().display().to_string(),
        )
        .unwrap();
    (
        ExtensionRegistry::new(Box::new(settings), test_requirements()),
        writable,
    )
}
