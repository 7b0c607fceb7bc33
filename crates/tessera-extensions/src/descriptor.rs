//! Extension description files
//!
//! An installed extension is described by a `.s4ext` file sitting next to its
//! directory under the install root. The format predates this codebase and is
//! shared with the build system, so reading and writing must stay bit-exact:
//!
//! - one `<key><space><value>` pair per line
//! - blank lines and lines starting with `#` are ignored when reading
//! - runs of whitespace inside a value collapse to single spaces
//! - the extension name is never stored; it is the file base name up to the
//!   first `.`
//! - fields are written in key order

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use tessera_core::keys::{KEY_INSTALLED, KEY_NAME, KEYS_NOT_WRITTEN};
use tessera_core::types::{bool_to_string, string_to_bool};
use tessera_core::ExtensionMetadata;

/// File extension of description files
pub const DESCRIPTION_FILE_EXTENSION: &str = "s4ext";

/// A parsed extension description: the extension name plus its metadata map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescription {
    /// Extension name, always equal to the descriptor file base name
    pub name: String,
    /// Descriptor fields, key-sorted
    pub metadata: ExtensionMetadata,
}

impl ExtensionDescription {
    pub fn new(name: impl Into<String>, metadata: ExtensionMetadata) -> Self {
        let mut description = Self {
            name: name.into(),
            metadata,
        };
        // The name lives outside the map; a stray copy would otherwise be
        // written back out by accident.
        description.metadata.remove(KEY_NAME);
        description
    }

    /// Extension name derived from a descriptor file name: everything up to
    /// the first `.` of the base name.
    pub fn name_from_path(path: &Path) -> String {
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match base.split_once('.') {
            Some((name, _)) => name.to_string(),
            None => base,
        }
    }

    /// Parse a description file from disk.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read description file {}", path.display()))?;
        Ok(Self::parse(&Self::name_from_path(path), &content))
    }

    /// Parse description file content for the given extension name.
    pub fn parse(name: &str, content: &str) -> Self {
        let mut metadata = ExtensionMetadata::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else { continue };
            let value = tokens.collect::<Vec<_>>().join(" ");
            metadata.insert(key.to_string(), value);
        }

        // Extensions described on disk are installed unless stated otherwise
        metadata
            .entry(KEY_INSTALLED.to_string())
            .or_insert_with(|| "true".to_string());

        Self::new(name, metadata)
    }

    /// Render the description file content.
    ///
    /// Fields come out in key order; the name and the transient flags are
    /// never written.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.metadata {
            if KEYS_NOT_WRITTEN.contains(&key.as_str()) {
                continue;
            }
            out.push_str(key);
            out.push(' ');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Write the description file to disk.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("Failed to write description file {}", path.display()))?;
        debug!("Wrote description file {}", path.display());
        Ok(())
    }

    pub fn get(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if key != KEY_NAME {
            self.metadata.insert(key.to_string(), value.into());
        }
    }

    /// Insert a value only when the field is currently missing or empty.
    pub fn set_if_empty(&mut self, key: &str, value: impl Into<String>) {
        if self.get(key).is_empty() {
            self.set(key, value);
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        string_to_bool(self.get(key))
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, bool_to_string(value));
    }
}

/// List description files under an install root, sorted case-insensitively
/// by file name. The extension match is case-insensitive as well, so
/// `Foo.S4EXT` is picked up.
pub fn scan_install_root(install_root: &Path) -> Result<Vec<PathBuf>> {
    if !install_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(install_root)
        .with_context(|| format!("Failed to list {}", install_root.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(DESCRIPTION_FILE_EXTENSION))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort_by_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}
