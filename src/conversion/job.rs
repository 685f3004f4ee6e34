//! Conversion jobs and the converter interface

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::flac::ToFlac;
use super::mp3::ToMp3;
use super::tool::{ToolCommand, ToolRunner};
use super::wav::ToWav;
use crate::core::Settings;
use crate::error::{Error, Result};

/// Target format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Wav,
    Mp3,
    Flac,
}

impl Format {
    /// Source folders are scanned in this order
    pub const ALL: [Format; 3] = [Format::Wav, Format::Mp3, Format::Flac];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Wav => "wav",
            Format::Mp3 => "mp3",
            Format::Flac => "flac",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One discovered file to convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    /// The source folder the file was found under
    pub source_root: PathBuf,
    pub format: Format,
    /// Print the commands instead of running them
    pub preview: bool,
    pub cover_image: Option<PathBuf>,
}

/// Outcome of a single conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    /// Whether every tool involved exited successfully
    pub success: bool,
    /// Commands that were run, or would have been run in preview
    pub commands: Vec<ToolCommand>,
}

impl ConversionResult {
    /// Nothing to do for this file
    pub fn skipped(input_path: &Path) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            success: true,
            commands: Vec::new(),
        }
    }

    pub fn finished(input_path: &Path, commands: Vec<ToolCommand>, success: bool) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            success,
            commands,
        }
    }
}

/// Something that can turn a source file into one target format
#[async_trait]
pub trait Converter: Send + Sync {
    fn output_format(&self) -> Format;

    /// Convert (or preview converting) the job's source file.
    ///
    /// A tool that exits non-zero yields `Ok` with `success == false`; `Err`
    /// is reserved for jobs that must not be attempted at all.
    async fn convert(&self, job: &ConversionJob) -> Result<ConversionResult>;
}

/// Fails unless `path` is an existing regular file
pub async fn ensure_source_file(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(Error::SourceMissing(path.to_path_buf())),
    }
}

/// One converter per target format
#[derive(Clone)]
pub struct ConverterSet {
    wav: Arc<dyn Converter>,
    mp3: Arc<dyn Converter>,
    flac: Arc<dyn Converter>,
}

impl ConverterSet {
    pub fn new(
        wav: Arc<dyn Converter>,
        mp3: Arc<dyn Converter>,
        flac: Arc<dyn Converter>,
    ) -> Self {
        Self { wav, mp3, flac }
    }

    pub fn from_settings(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self::new(
            Arc::new(ToWav::from_settings(settings, runner.clone())),
            Arc::new(ToMp3::from_settings(settings, runner.clone())),
            Arc::new(ToFlac::from_settings(settings, runner)),
        )
    }

    pub fn get(&self, format: Format) -> Arc<dyn Converter> {
        match format {
            Format::Wav => self.wav.clone(),
            Format::Mp3 => self.mp3.clone(),
            Format::Flac => self.flac.clone(),
        }
    }
}
