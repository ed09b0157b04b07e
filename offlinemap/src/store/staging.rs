//! Staging directories for in-progress exports.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::{remove_dir_if_exists, OfflineCacheHandle, PACKAGE_FILE_NAME, RESOURCES_DIR_NAME};

/// How an export replaces the existing offline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Write into a sibling staging directory and swap it in on success.
    /// A failed or cancelled export leaves the previous cache untouched.
    #[default]
    Staged,
    /// Remove the cache directory before writing into it. A failed export
    /// leaves the store empty.
    ClearFirst,
}

impl ReplacePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::ClearFirst => "clear_first",
        }
    }
}

impl fmt::Display for ReplacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staged" => Ok(Self::Staged),
            "clear_first" | "clear-first" => Ok(Self::ClearFirst),
            other => Err(format!(
                "unknown replace policy '{}', expected 'staged' or 'clear_first'",
                other
            )),
        }
    }
}

/// A freshly cleared directory an export writes its artifacts into.
///
/// Exactly one of [`commit`](Self::commit) or [`discard`](Self::discard)
/// should be called. A staging area dropped without either is discarded on a
/// best-effort basis.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    target: PathBuf,
    previous: PathBuf,
    policy: ReplacePolicy,
    finished: bool,
}

impl StagingArea {
    pub(super) fn new(dir: PathBuf, target: PathBuf, previous: PathBuf, policy: ReplacePolicy) -> Self {
        Self {
            dir,
            target,
            previous,
            policy,
            finished: false,
        }
    }

    /// Directory being written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> ReplacePolicy {
        self.policy
    }

    /// Where the export should write its package.
    pub fn package_path(&self) -> PathBuf {
        self.dir.join(PACKAGE_FILE_NAME)
    }

    /// Where the export should write supplementary resources.
    pub fn resources_path(&self) -> PathBuf {
        self.dir.join(RESOURCES_DIR_NAME)
    }

    /// Makes the staged artifacts the live offline cache.
    ///
    /// Under [`ReplacePolicy::Staged`] the live directory is moved aside, the
    /// staging directory renamed into its place, and the old copy removed.
    /// The caller must have validated the package before committing.
    pub fn commit(mut self) -> StoreResult<OfflineCacheHandle> {
        self.finished = true;

        if self.policy == ReplacePolicy::Staged {
            remove_dir_if_exists(&self.previous)?;

            let had_previous = self.target.exists();
            if had_previous {
                rename(&self.target, &self.previous)?;
            }

            if let Err(e) = rename(&self.dir, &self.target) {
                // Put the old cache back so the store is never left empty here
                if had_previous {
                    if let Err(restore) = fs::rename(&self.previous, &self.target) {
                        warn!(error = %restore, "Failed to restore previous offline cache");
                    }
                }
                return Err(e);
            }

            if had_previous {
                if let Err(e) = remove_dir_if_exists(&self.previous) {
                    warn!(error = %e, "Failed to remove previous offline cache");
                }
            }
        }

        let package_path = self.target.join(PACKAGE_FILE_NAME);
        let resources = self.target.join(RESOURCES_DIR_NAME);
        let resources_path = if resources.is_dir() {
            Some(resources)
        } else {
            None
        };

        info!(target = %self.target.display(), "Offline cache committed");
        Ok(OfflineCacheHandle {
            package_path,
            resources_path,
        })
    }

    /// Abandons the staged artifacts.
    ///
    /// Under [`ReplacePolicy::Staged`] the staging directory is removed and
    /// the live cache is untouched. Under [`ReplacePolicy::ClearFirst`] the
    /// partial artifacts are removed, leaving the store empty.
    pub fn discard(mut self) -> StoreResult<()> {
        self.finished = true;
        self.remove_partial()
    }

    fn remove_partial(&self) -> StoreResult<()> {
        match self.policy {
            ReplacePolicy::Staged => remove_dir_if_exists(&self.dir),
            ReplacePolicy::ClearFirst => {
                let package = self.package_path();
                match fs::remove_file(&package) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(StoreError::ClearFailed {
                            path: package,
                            source: e,
                        })
                    }
                }
                remove_dir_if_exists(&self.resources_path())
            }
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.remove_partial() {
                warn!(error = %e, "Failed to remove abandoned staging directory");
            }
        }
    }
}

fn rename(from: &Path, to: &Path) -> StoreResult<()> {
    fs::rename(from, to).map_err(|e| StoreError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}
