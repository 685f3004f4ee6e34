//! Error types for batch conversion

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop a job or the whole run
#[derive(Debug, Error)]
pub enum Error {
    /// A source folder (or something inside it) could not be listed.
    /// Fatal for the whole run.
    #[error("Unable to open {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The job's source is gone or is not a regular file
    #[error("Source is not a regular file: {0}")]
    SourceMissing(PathBuf),

    /// MP3 sources are never converted to FLAC
    #[error("Refusing to convert lossy source to FLAC: {0}")]
    LossySource(PathBuf),

    /// An external tool could not be started at all
    #[error("Failed to launch {program}: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Moving a processed source into the done tree failed
    #[error("Failed to move {from} to {to}: {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but could not be read or parsed
    #[error("Invalid settings file {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for errors that abort the run
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Discovery { .. } | Error::Settings { .. } => 2,
            _ => 1,
        }
    }
}
