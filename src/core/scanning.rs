//! Source folder scanning and job discovery
//!
//! Every file under each source folder becomes one job for that folder's
//! target format. Cover images are not jobs themselves; the first one found
//! next to an audio file is attached to its job.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::state::Settings;
use crate::audio::has_extension;
use crate::conversion::{is_reencoded_copy, ConversionJob, Format};
use crate::error::{Error, Result};

/// All regular files beneath `root`, in file-name order
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Discovery {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such folder"),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Discovery {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// First cover image in `dir`.
///
/// The lower-case extension is tried before the upper-case one, and names
/// are compared in order; the extension match itself is case-sensitive.
pub fn find_cover_image(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut names: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    names.sort();

    [extension.to_lowercase(), extension.to_uppercase()]
        .iter()
        .find_map(|ext| {
            names
                .iter()
                .find(|p| p.extension().is_some_and(|e| e == ext.as_str()))
                .cloned()
        })
}

/// Builds the job list from the source folders
pub struct ConversionDispatcher<'a> {
    settings: &'a Settings,
    preview: bool,
}

impl<'a> ConversionDispatcher<'a> {
    pub fn new(settings: &'a Settings, preview: bool) -> Self {
        Self { settings, preview }
    }

    /// Jobs for every source folder, in folder then file-name order.
    ///
    /// A missing or unreadable source folder aborts discovery.
    pub fn discover(&self) -> Result<Vec<ConversionJob>> {
        let mut jobs = Vec::new();
        for format in Format::ALL {
            let folder_jobs = self.discover_folder(format)?;
            println!(
                "{} files from folder ({}) to be converted to {}",
                folder_jobs.len(),
                self.settings.source_folder(format),
                format
            );
            jobs.extend(folder_jobs);
        }
        Ok(jobs)
    }

    fn discover_folder(&self, format: Format) -> Result<Vec<ConversionJob>> {
        let root = self.settings.source_dir(format);
        let cover_ext = &self.settings.cover_extension;

        let jobs = list_files(&root)?
            .into_iter()
            .filter(|path| !has_extension(path, cover_ext))
            .filter(|path| {
                let repaired = format == Format::Flac && is_reencoded_copy(path);
                if repaired {
                    log::debug!("Skipping repaired copy {}", path.display());
                }
                !repaired
            })
            .map(|path| {
                let cover_image = path
                    .parent()
                    .and_then(|dir| find_cover_image(dir, cover_ext));
                ConversionJob {
                    source_path: path,
                    source_root: root.clone(),
                    format,
                    preview: self.preview,
                    cover_image,
                }
            })
            .collect();
        Ok(jobs)
    }
}
