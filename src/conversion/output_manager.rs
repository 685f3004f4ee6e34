//! Done tree management
//!
//! Processed sources are moved under the done root, keeping their path
//! relative to the source folder they were found in:
//! `2mp3/Rock/TheBand/x.wav` ends up at `done/Rock/TheBand/x.wav`.
//!
//! Several jobs may create the same directories at once; a directory that
//! already exists is never an error. A file that already exists is: nothing
//! in the done tree is ever replaced.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct DoneTree {
    root: PathBuf,
}

impl DoneTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mirrored location of `source`, or `None` if it is not under `source_root`
    pub fn destination_for(&self, source: &Path, source_root: &Path) -> Option<PathBuf> {
        source
            .strip_prefix(source_root)
            .ok()
            .filter(|relative| relative.file_name().is_some())
            .map(|relative| self.root.join(relative))
    }

    /// Move `source` into the done tree, returning its new location
    pub async fn relocate(&self, source: &Path, source_root: &Path) -> Result<PathBuf> {
        let destination =
            self.destination_for(source, source_root)
                .ok_or_else(|| Error::Relocate {
                    from: source.to_path_buf(),
                    to: self.root.clone(),
                    source: std::io::Error::new(
                        ErrorKind::InvalidInput,
                        format!("not inside {}", source_root.display()),
                    ),
                })?;

        if let Some(parent) = destination.parent() {
            ensure_dir(parent).await?;
        }
        move_file(source, &destination).await?;
        Ok(destination)
    }
}

/// Create `dir` and its parents, tolerating concurrent creation
async fn ensure_dir(dir: &Path) -> Result<()> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Rename, falling back to copy + remove across filesystems.
///
/// Fails with `AlreadyExists` rather than overwrite `to`.
async fn move_file(from: &Path, to: &Path) -> Result<()> {
    let relocate_error = |source| Error::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if tokio::fs::try_exists(to).await.map_err(relocate_error)? {
        return Err(relocate_error(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "destination already exists in the done tree",
        )));
    }

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tokio::fs::copy(from, to).await.map_err(relocate_error)?;
            tokio::fs::remove_file(from).await.map_err(relocate_error)
        }
        Err(e) => Err(relocate_error(e)),
    }
}
