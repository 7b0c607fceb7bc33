//! Persisted application settings
//!
//! The registry never touches the settings file directly; it goes through
//! the [`SettingsStore`] trait so tests can substitute an in-memory store
//! and embedders can bridge to their own settings framework.
//!
//! Keys use the application's historical `Section/Key` addressing
//! (`Extensions/ServerUrl`, `Modules/AdditionalPaths`). The file-backed
//! implementation maps a section onto a TOML table and re-reads the
//! document before every mutation, so concurrent processes lose no more
//! than the last write.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Abstraction over the persisted settings document.
pub trait SettingsStore {
    /// Read a single string value.
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Write a single string value.
    fn set_string(&mut self, key: &str, value: &str) -> Result<()>;

    /// Read a list of strings; missing keys read as the empty list.
    fn get_string_list(&self, key: &str) -> Result<Vec<String>>;

    /// Write a list of strings. An empty list removes the key.
    fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<()>;

    /// Remove a key if present.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Read the values of an indexed-array section, e.g. the `path` field
    /// of the `LibraryPaths` section.
    fn read_array_values(&self, array: &str, field: &str) -> Result<Vec<String>>;

    /// Replace the values of an indexed-array section.
    fn write_array_values(&mut self, array: &str, field: &str, values: &[String]) -> Result<()>;

    /// Whether mutations can be persisted at all.
    fn is_writable(&self) -> bool;
}

fn split_key(key: &str) -> (Option<&str>, &str) {
    match key.split_once('/') {
        Some((section, name)) => (Some(section), name),
        None => (None, key),
    }
}

fn lookup<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    let (section, name) = split_key(key);
    match section {
        Some(section) => table.get(section)?.as_table()?.get(name),
        None => table.get(name),
    }
}

fn insert(table: &mut Table, key: &str, value: Value) {
    let (section, name) = split_key(key);
    match section {
        Some(section) => {
            let entry = table
                .entry(section.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            if let Some(section_table) = entry.as_table_mut() {
                section_table.insert(name.to_string(), value);
            }
        }
        None => {
            table.insert(name.to_string(), value);
        }
    }
}

fn remove_key(table: &mut Table, key: &str) {
    let (section, name) = split_key(key);
    match section {
        Some(section) => {
            let empty = if let Some(section_table) =
                table.get_mut(section).and_then(Value::as_table_mut)
            {
                section_table.remove(name);
                section_table.is_empty()
            } else {
                false
            };
            if empty {
                table.remove(section);
            }
        }
        None => {
            table.remove(name);
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        // A scalar written where a list is expected reads as a one-element list
        other => vec![value_to_string(other)],
    }
}

fn get_string_in(table: &Table, key: &str) -> Option<String> {
    lookup(table, key).map(value_to_string)
}

fn get_string_list_in(table: &Table, key: &str) -> Vec<String> {
    lookup(table, key)
        .map(value_to_string_list)
        .unwrap_or_default()
}

fn set_string_list_in(table: &mut Table, key: &str, values: &[String]) {
    if values.is_empty() {
        remove_key(table, key);
    } else {
        let items = values.iter().cloned().map(Value::String).collect();
        insert(table, key, Value::Array(items));
    }
}

/// Settings store backed by a TOML document on disk.
///
/// Every operation re-reads the document and every mutation rewrites it in
/// full; nothing is cached between calls.
pub struct TomlSettings {
    path: PathBuf,
}

impl TomlSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Table> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.parse::<Table>().map_err(Error::SettingsParse)?)
    }

    fn save(&self, table: &Table) -> Result<()> {
        if !self.is_writable() {
            return Err(Error::SettingsNotWritable);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(table)?;
        std::fs::write(&self.path, rendered)?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

impl SettingsStore for TomlSettings {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(get_string_in(&self.load()?, key))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        let mut table = self.load()?;
        insert(&mut table, key, Value::String(value.to_string()));
        self.save(&table)
    }

    fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(get_string_list_in(&self.load()?, key))
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        let mut table = self.load()?;
        set_string_list_in(&mut table, key, values);
        self.save(&table)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut table = self.load()?;
        remove_key(&mut table, key);
        self.save(&table)
    }

    fn read_array_values(&self, array: &str, field: &str) -> Result<Vec<String>> {
        self.get_string_list(&format!("{array}/{field}"))
    }

    fn write_array_values(&mut self, array: &str, field: &str, values: &[String]) -> Result<()> {
        self.set_string_list(&format!("{array}/{field}"), values)
    }

    fn is_writable(&self) -> bool {
        if self.path.exists() {
            std::fs::metadata(&self.path)
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false)
        } else {
            // A new document is writable if its directory is, or can be created
            match self.path.parent() {
                Some(parent) if parent.as_os_str().is_empty() => true,
                Some(parent) if parent.exists() => std::fs::metadata(parent)
                    .map(|m| !m.permissions().readonly())
                    .unwrap_or(false),
                Some(_) => true,
                None => true,
            }
        }
    }
}

/// In-memory settings store for tests and embedders without a settings file.
#[derive(Default)]
pub struct MemorySettings {
    table: Table,
    read_only: bool,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent mutations fail, to exercise unwritable-settings paths.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::SettingsNotWritable)
        } else {
            Ok(())
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(get_string_in(&self.table, key))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        insert(&mut self.table, key, Value::String(value.to_string()));
        Ok(())
    }

    fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(get_string_list_in(&self.table, key))
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        self.check_writable()?;
        set_string_list_in(&mut self.table, key, values);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable()?;
        remove_key(&mut self.table, key);
        Ok(())
    }

    fn read_array_values(&self, array: &str, field: &str) -> Result<Vec<String>> {
        self.get_string_list(&format!("{array}/{field}"))
    }

    fn write_array_values(&mut self, array: &str, field: &str, values: &[String]) -> Result<()> {
        self.set_string_list(&format!("{array}/{field}"), values)
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_settings_string_round_trip() {
        let mut settings = MemorySettings::new();
        settings
            .set_string("Extensions/ServerUrl", "https://example.org")
            .unwrap();
        assert_eq!(
            settings.get_string("Extensions/ServerUrl").unwrap(),
            Some("https://example.org".to_string())
        );
        assert_eq!(settings.get_string("Extensions/Missing").unwrap(), None);
    }

    #[test]
    fn test_memory_settings_list_round_trip() {
        let mut settings = MemorySettings::new();
        let values = vec!["/a/b".to_string(), "/c/d".to_string()];
        settings
            .set_string_list("Modules/AdditionalPaths", &values)
            .unwrap();
        assert_eq!(
            settings.get_string_list("Modules/AdditionalPaths").unwrap(),
            values
        );

        // Empty list removes the key
        settings
            .set_string_list("Modules/AdditionalPaths", &[])
            .unwrap();
        assert!(settings
            .get_string_list("Modules/AdditionalPaths")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_memory_settings_read_only_rejects_writes() {
        let mut settings = MemorySettings::new();
        settings.set_read_only(true);
        assert!(!settings.is_writable());
        let err = settings.set_string("Extensions/ServerUrl", "x").unwrap_err();
        assert!(matches!(err, Error::SettingsNotWritable));
    }

    #[test]
    fn test_toml_settings_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = TomlSettings::new(&path);
        settings.set_string("Extensions/InstallPath", "/opt/ext").unwrap();
        settings
            .write_array_values("LibraryPaths", "path", &["/opt/ext/a/lib".to_string()])
            .unwrap();

        let reopened = TomlSettings::new(&path);
        assert_eq!(
            reopened.get_string("Extensions/InstallPath").unwrap(),
            Some("/opt/ext".to_string())
        );
        assert_eq!(
            reopened.read_array_values("LibraryPaths", "path").unwrap(),
            vec!["/opt/ext/a/lib".to_string()]
        );
    }

    #[test]
    fn test_toml_settings_remove_prunes_empty_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = TomlSettings::new(&path);
        settings.set_string("Extensions/ServerUrl", "https://example.org").unwrap();
        settings.remove("Extensions/ServerUrl").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("Extensions"));
    }

    #[test]
    fn test_toml_settings_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let settings = TomlSettings::new(dir.path().join("absent.toml"));
        assert_eq!(settings.get_string("Extensions/ServerUrl").unwrap(), None);
        assert!(settings.get_string_list("Extensions/Bookmarked").unwrap().is_empty());
    }
}
