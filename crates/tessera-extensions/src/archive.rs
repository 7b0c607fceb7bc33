//! Extension archive extraction
//!
//! Decompression sits behind the [`ArchiveExtractor`] trait so the registry
//! never depends on a particular archive format; [`TarGzExtractor`] is the
//! default implementation. Where the extension payload lives inside the
//! extracted tree varies by packaging flavor and is answered by an
//! [`ArchiveLayout`].
//!
//! [`install_archive_payload`] runs the whole sequence: extract, validate the
//! single top-level directory, locate the payload, and move it into place
//! through a staging directory. If any step fails the target directory is
//! removed again, so the install root never keeps a partial extension.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, warn};
use walkdir::WalkDir;

use tessera_core::{Error, Requirements};

/// Unpacks an extension archive into a directory.
pub trait ArchiveExtractor {
    /// Extract `archive` into `destination`, returning the extracted file
    /// paths. Directories do not count as files.
    fn extract(&self, archive: &Path, destination: &Path) -> Result<Vec<PathBuf>>;
}

/// Default extractor for `.tar.gz` extension archives.
#[derive(Debug, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
        let file = File::open(archive)
            .with_context(|| format!("Failed to open archive {}", archive.display()))?;
        let mut tar = tar::Archive::new(GzDecoder::new(file));

        let mut files = Vec::new();
        for entry in tar
            .entries()
            .with_context(|| format!("Failed to read archive {}", archive.display()))?
        {
            let mut entry = entry?;
            let is_file = entry.header().entry_type().is_file();
            let path = entry.path()?.into_owned();
            // unpack_in refuses paths escaping the destination
            let unpacked = entry.unpack_in(destination).with_context(|| {
                format!("Failed to extract {} from {}", path.display(), archive.display())
            })?;
            if unpacked && is_file {
                files.push(destination.join(&path));
            }
        }
        debug!(
            "Extracted {} files from {} into {}",
            files.len(),
            archive.display(),
            destination.display()
        );
        Ok(files)
    }
}

/// Locates the extension payload inside an extracted archive tree.
pub trait ArchiveLayout {
    /// Given the archive's single top-level directory, return the directory
    /// whose contents are the extension payload.
    fn payload_dir(
        &self,
        archive_root: &Path,
        extension_name: &str,
        requirements: &Requirements,
    ) -> Result<PathBuf>;
}

/// Plain packaging: the top-level archive directory is the payload.
#[derive(Debug, Default)]
pub struct FlatLayout;

impl ArchiveLayout for FlatLayout {
    fn payload_dir(
        &self,
        archive_root: &Path,
        _extension_name: &str,
        _requirements: &Requirements,
    ) -> Result<PathBuf> {
        Ok(archive_root.to_path_buf())
    }
}

/// Application-bundle packaging: the payload is nested inside the bundle at
/// a path derived from the extension name and application revision.
///
/// The nested path is a `/`-separated pattern where `{name}` and
/// `{revision}` are substituted, e.g.
/// `Contents/Extensions-{revision}/{name}`.
#[derive(Debug)]
pub struct BundleLayout {
    pattern: String,
}

impl BundleLayout {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl ArchiveLayout for BundleLayout {
    fn payload_dir(
        &self,
        archive_root: &Path,
        extension_name: &str,
        requirements: &Requirements,
    ) -> Result<PathBuf> {
        let nested = self
            .pattern
            .replace("{name}", extension_name)
            .replace("{revision}", &requirements.revision);
        let mut dir = archive_root.to_path_buf();
        for part in nested.split('/').filter(|p| !p.is_empty()) {
            dir.push(part);
        }
        if !dir.is_dir() {
            anyhow::bail!(
                "Bundle payload directory {} is missing from the archive",
                dir.display()
            );
        }
        Ok(dir)
    }
}

/// Copy the contents of `src` into `dst` recursively. `dst` must exist.
pub fn copy_directory_contents(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// The single top-level directory of an extracted archive.
fn archive_root_dir(target: &Path, archive: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(target)? {
        entries.push(entry?.path());
    }
    match entries.as_slice() {
        [single] if single.is_dir() => Ok(single.clone()),
        [] => Err(Error::invalid_archive_layout(
            archive.display().to_string(),
            "archive has no top-level directory",
        )
        .into()),
        _ => {
            let names: Vec<_> = entries
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            Err(Error::invalid_archive_layout(
                archive.display().to_string(),
                format!("found {} top-level entries ({})", entries.len(), names.join(", ")),
            )
            .into())
        }
    }
}

/// Extract `archive` and place the extension payload at
/// `<destination>/<extension_name>`.
///
/// On failure the target directory is removed again; callers can rely on it
/// being either complete or absent.
pub fn install_archive_payload(
    extractor: &dyn ArchiveExtractor,
    layout: &dyn ArchiveLayout,
    extension_name: &str,
    archive: &Path,
    destination: &Path,
    requirements: &Requirements,
) -> Result<()> {
    if extension_name.is_empty() {
        return Err(Error::EmptyExtensionName.into());
    }
    if !destination.is_dir() {
        return Err(Error::install_root_unavailable(
            destination.display().to_string(),
            "directory does not exist",
        )
        .into());
    }
    let meta = std::fs::metadata(destination)?;
    if meta.permissions().readonly() {
        return Err(Error::install_root_unavailable(
            destination.display().to_string(),
            "directory is not writable",
        )
        .into());
    }

    let target = destination.join(extension_name);
    remove_dir_if_present(&target)
        .with_context(|| format!("Failed to clear {}", target.display()))?;
    std::fs::create_dir_all(&target)?;

    let result = extract_into_target(extractor, layout, extension_name, archive, &target, requirements);
    if result.is_err() {
        // Leave the install root as if nothing happened
        if let Err(cleanup) = remove_dir_if_present(&target) {
            warn!(
                "Failed to clean up {} after extraction error: {}",
                target.display(),
                cleanup
            );
        }
    }
    result
}

fn extract_into_target(
    extractor: &dyn ArchiveExtractor,
    layout: &dyn ArchiveLayout,
    extension_name: &str,
    archive: &Path,
    target: &Path,
    requirements: &Requirements,
) -> Result<()> {
    let files = extractor.extract(archive, target)?;
    if files.is_empty() {
        return Err(Error::empty_archive(archive.display().to_string()).into());
    }

    let archive_root = archive_root_dir(target, archive)?;
    let payload = layout.payload_dir(&archive_root, extension_name, requirements)?;

    // Move the payload up through a staging directory, then drop the
    // archive's own top-level folder.
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{extension_name}-staging-"))
        .tempdir_in(target.parent().expect("target has a parent"))
        .context("Failed to create staging directory")?;
    copy_directory_contents(&payload, staging.path())?;
    copy_directory_contents(staging.path(), target)?;
    drop(staging);
    remove_dir_if_present(&archive_root)
        .with_context(|| format!("Failed to remove {}", archive_root.display()))?;

    debug!(
        "Installed payload of {} at {}",
        archive.display(),
        target.display()
    );
    Ok(())
}
