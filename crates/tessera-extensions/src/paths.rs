//! Search-path bookkeeping
//!
//! Installing or enabling an extension adds its module, library, binary,
//! and python directories to the application search paths persisted in
//! settings; disabling or scheduling removal takes them out again. The
//! subdirectories that exist inside an extension vary by packaging, so the
//! layout is data: directories that do not exist on disk are simply skipped
//! when paths are appended.

use std::path::{Path, PathBuf};

/// Per-extension subdirectories feeding the application search paths.
#[derive(Debug, Clone)]
pub struct SearchPathLayout {
    /// Subdirectories appended to `Modules/AdditionalPaths`
    pub module_subdirs: Vec<String>,
    /// Subdirectories appended to the `LibraryPaths` array
    pub library_subdirs: Vec<String>,
    /// Subdirectories appended to the `Paths` array
    pub bin_subdirs: Vec<String>,
    /// Subdirectories appended to the `PYTHONPATH` array
    pub python_subdirs: Vec<String>,
}

impl Default for SearchPathLayout {
    fn default() -> Self {
        Self {
            module_subdirs: vec!["lib/modules".to_string()],
            library_subdirs: vec!["lib".to_string()],
            bin_subdirs: vec!["bin".to_string()],
            python_subdirs: vec!["lib/python".to_string()],
        }
    }
}

impl SearchPathLayout {
    fn join_all(extension_dir: &Path, subdirs: &[String]) -> Vec<PathBuf> {
        subdirs.iter().map(|s| extension_dir.join(s)).collect()
    }

    pub fn module_paths(&self, extension_dir: &Path) -> Vec<PathBuf> {
        Self::join_all(extension_dir, &self.module_subdirs)
    }

    pub fn library_paths(&self, extension_dir: &Path) -> Vec<PathBuf> {
        Self::join_all(extension_dir, &self.library_subdirs)
    }

    pub fn bin_paths(&self, extension_dir: &Path) -> Vec<PathBuf> {
        Self::join_all(extension_dir, &self.bin_subdirs)
    }

    pub fn python_paths(&self, extension_dir: &Path) -> Vec<PathBuf> {
        Self::join_all(extension_dir, &self.python_subdirs)
    }
}

/// Append paths to a search-path list, keeping order, skipping entries
/// already present and directories that do not exist on disk.
pub fn append_to_path_list(
    list: Vec<String>,
    additions: impl IntoIterator<Item = PathBuf>,
) -> Vec<String> {
    let mut list = list;
    for path in additions {
        if !path.exists() {
            continue;
        }
        let rendered = path.display().to_string();
        if !list.contains(&rendered) {
            list.push(rendered);
        }
    }
    list
}

/// Remove paths from a search-path list, keeping the order of the rest.
pub fn remove_from_path_list(
    list: Vec<String>,
    removals: impl IntoIterator<Item = PathBuf>,
) -> Vec<String> {
    let removals: Vec<String> = removals
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();
    list.into_iter()
        .filter(|entry| !removals.contains(entry))
        .collect()
}
