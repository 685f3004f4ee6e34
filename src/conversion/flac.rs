//! Conversion to FLAC
//!
//! WAV files are encoded directly, tagged from the folder hierarchy. FLAC
//! files get a repair re-encode: some FLAC files turn into noise when later
//! fed through the encoder/tagger, and a round trip through WAV fixes them.
//! MP3 input is refused.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::job::{ensure_source_file, ConversionJob, ConversionResult, Converter, Format};
use super::tool::{check_status, print_preview, ToolCommand, ToolRunner};
use crate::audio::{has_extension, lowercase_extension, tags_from_file, tags_from_path, TagSet};
use crate::core::Settings;
use crate::error::{Error, Result};

const DEFAULT_OPTIONS: &[&str] = &["-8", "--replay-gain"];

/// Suffix for the re-encoded copy of a FLAC source
pub const REENCODED_SUFFIX: &str = "-reencoded";

pub struct ToFlac {
    runner: Arc<dyn ToolRunner>,
    flac: String,
    sox: String,
    source_folder: String,
    options: Vec<String>,
}

/// Removes the intermediate WAV on every exit path
struct TempWav(PathBuf);

impl Drop for TempWav {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => log::debug!("Removed temporary file {}", self.0.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temporary file {}: {}", self.0.display(), e),
        }
    }
}

/// Unique scratch WAV next to `source`
pub fn temp_wav_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string());
    source.with_file_name(format!("{}.{}.tmp.wav", stem, uuid::Uuid::new_v4()))
}

/// Where the repaired copy of `source` is written
pub fn reencoded_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string());
    source.with_file_name(format!("{}{}.flac", stem, REENCODED_SUFFIX))
}

/// True for a copy written by the repair re-encode, which is never a source
pub fn is_reencoded_copy(path: &Path) -> bool {
    has_extension(path, "flac")
        && path
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().ends_with(REENCODED_SUFFIX))
}

impl ToFlac {
    pub fn from_settings(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            flac: settings.tools.flac.clone(),
            sox: settings.tools.sox.clone(),
            source_folder: settings.source_folder(Format::Flac).to_string(),
            options: settings.extra_options(Format::Flac).to_vec(),
        }
    }

    /// `flac -8 --replay-gain --tag=K=V ... [options]`, input and output left to the caller
    fn encode_command(&self, tags: &TagSet) -> ToolCommand {
        let tag_options = tags
            .iter()
            .map(|(key, value)| format!("--tag={}={}", key, value));
        ToolCommand::new(&self.flac)
            .args(DEFAULT_OPTIONS)
            .args(tag_options)
            .args(&self.options)
    }

    async fn encode_wav(&self, job: &ConversionJob) -> Result<ConversionResult> {
        let tags = tags_from_path(&job.source_path, &self.source_folder);
        let command = self.encode_command(&tags).arg(&job.source_path);

        if job.preview {
            print_preview(&command);
            return Ok(ConversionResult::finished(&job.source_path, vec![command], true));
        }

        let outcome = self.runner.run(&command).await;
        let success = check_status(&command, &outcome);
        Ok(ConversionResult::finished(&job.source_path, vec![command], success))
    }

    async fn reencode_flac(&self, job: &ConversionJob) -> Result<ConversionResult> {
        let source = &job.source_path;
        let temp = temp_wav_path(source);
        let output = reencoded_path(source);
        let decode = ToolCommand::new(&self.flac)
            .arg("-d")
            .arg("-o")
            .arg(&temp)
            .arg(source);

        if job.preview {
            let encode = self
                .encode_command(&TagSet::new())
                .arg("-f")
                .arg("-o")
                .arg(&output)
                .arg(&temp);
            print_preview(&decode);
            print_preview(&encode);
            return Ok(ConversionResult::finished(source, vec![decode, encode], true));
        }

        let _cleanup = TempWav(temp.clone());

        let outcome = self.runner.run(&decode).await;
        if !check_status(&decode, &outcome) {
            return Ok(ConversionResult::finished(source, vec![decode], false));
        }

        let tags = tags_from_file(self.runner.as_ref(), &self.sox, source).await;
        let encode = self
            .encode_command(&tags)
            .arg("-f")
            .arg("-o")
            .arg(&output)
            .arg(&temp);
        let outcome = self.runner.run(&encode).await;
        let success = check_status(&encode, &outcome);

        if success {
            log::info!("Re-encoded {} -> {}", source.display(), output.display());
        }
        Ok(ConversionResult::finished(source, vec![decode, encode], success))
    }
}

#[async_trait]
impl Converter for ToFlac {
    fn output_format(&self) -> Format {
        Format::Flac
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConversionResult> {
        ensure_source_file(&job.source_path).await?;

        match lowercase_extension(&job.source_path).as_deref() {
            Some("mp3") => Err(Error::LossySource(job.source_path.clone())),
            Some("wav") => {
                println!("->FLAC: {}", job.source_path.display());
                self.encode_wav(job).await
            }
            Some("flac") => {
                println!("->FLAC (re-encode): {}", job.source_path.display());
                self.reencode_flac(job).await
            }
            _ => {
                log::debug!("Skipping non-audio file {}", job.source_path.display());
                Ok(ConversionResult::skipped(&job.source_path))
            }
        }
    }
}
