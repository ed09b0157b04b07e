//! Offline cache store.
//!
//! The store owns a single application-data directory `D` laid out as:
//!
//! ```text
//! D/
//! ├── vectorTiles.vtpk      exported tile package
//! └── itemResources/        optional style resources (fonts, sprites, style)
//! ```
//!
//! Files stay on disk until explicitly removed. Absence of either artifact is
//! a normal state: [`OfflineCacheStore::load_if_present`] returns `None` when
//! there is no package and reports missing resources through
//! [`OfflineCacheHandle::has_resources`].
//!
//! New exports never write into `D` directly under the default
//! [`ReplacePolicy::Staged`]: they write into a sibling staging directory that
//! is swapped in by [`StagingArea::commit`] only after the package has been
//! validated. [`ReplacePolicy::ClearFirst`] removes `D` before writing.

mod error;
mod staging;

pub use error::{StoreError, StoreResult};
pub use staging::{ReplacePolicy, StagingArea};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// File name of the exported tile package.
pub const PACKAGE_FILE_NAME: &str = "vectorTiles.vtpk";

/// Directory name of the optional resource bundle.
pub const RESOURCES_DIR_NAME: &str = "itemResources";

/// Reference to an exported package on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineCacheHandle {
    package_path: PathBuf,
    resources_path: Option<PathBuf>,
}

impl OfflineCacheHandle {
    pub fn package_path(&self) -> &Path {
        &self.package_path
    }

    /// Resource bundle directory, when one exists.
    pub fn resources_path(&self) -> Option<&Path> {
        self.resources_path.as_deref()
    }

    pub fn has_resources(&self) -> bool {
        self.resources_path.is_some()
    }
}

/// Result of clearing the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: usize,
    pub bytes_freed: u64,
}

/// File count and size of the store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub files: usize,
    pub bytes: u64,
}

/// The on-disk offline cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct OfflineCacheStore {
    root: PathBuf,
}

impl OfflineCacheStore {
    /// Creates a store rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Well-known package path inside the root.
    pub fn package_path(&self) -> PathBuf {
        self.root.join(PACKAGE_FILE_NAME)
    }

    /// Well-known resource bundle path inside the root.
    pub fn resources_path(&self) -> PathBuf {
        self.root.join(RESOURCES_DIR_NAME)
    }

    /// Returns a handle if a package file exists.
    ///
    /// Only existence is checked here; the package is validated when an
    /// offline basemap is built from it.
    pub fn load_if_present(&self) -> Option<OfflineCacheHandle> {
        let package_path = self.package_path();
        if !package_path.is_file() {
            debug!(path = %package_path.display(), "No offline package present");
            return None;
        }

        let resources = self.resources_path();
        let resources_path = if resources.is_dir() {
            Some(resources)
        } else {
            None
        };

        Some(OfflineCacheHandle {
            package_path,
            resources_path,
        })
    }

    /// Prepares a clean directory for a new export.
    ///
    /// Any leftover staging directory from an interrupted export is removed
    /// first. Under [`ReplacePolicy::ClearFirst`] the live cache itself is
    /// removed and recreated here, before any tile is written.
    pub fn prepare_export(&self, policy: ReplacePolicy) -> StoreResult<StagingArea> {
        let previous = self.sibling(".previous")?;
        let dir = match policy {
            ReplacePolicy::Staged => self.sibling(".staging")?,
            ReplacePolicy::ClearFirst => self.root.clone(),
        };

        remove_dir_if_exists(&dir)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDirFailed {
            path: dir.clone(),
            source: e,
        })?;

        info!(dir = %dir.display(), ?policy, "Prepared offline cache directory for export");
        Ok(StagingArea::new(dir, self.root.clone(), previous, policy))
    }

    /// Removes the whole cache directory.
    pub fn clear(&self) -> StoreResult<ClearResult> {
        let stats = self.stats()?;
        remove_dir_if_exists(&self.root)?;
        info!(
            root = %self.root.display(),
            files = stats.files,
            bytes = stats.bytes,
            "Offline cache cleared"
        );
        Ok(ClearResult {
            files_deleted: stats.files,
            bytes_freed: stats.bytes,
        })
    }

    /// Counts files and bytes under the root. An absent root is empty.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats::default();
        if self.root.exists() {
            walk(&self.root, &mut stats)?;
        }
        Ok(stats)
    }

    fn sibling(&self, suffix: &str) -> StoreResult<PathBuf> {
        let name = self
            .root
            .file_name()
            .ok_or_else(|| StoreError::InvalidRoot(self.root.clone()))?;
        let mut sibling = name.to_os_string();
        sibling.push(suffix);
        Ok(self.root.with_file_name(sibling))
    }
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> StoreResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::ClearFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn walk(dir: &Path, stats: &mut StoreStats) -> StoreResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::ReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| StoreError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            walk(&path, stats)?;
        } else {
            stats.files += 1;
            stats.bytes += metadata.len();
        }
    }
    Ok(())
}
