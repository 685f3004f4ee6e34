//! Conversion to WAV
//!
//! FLAC is decoded with `flac -d`, MP3 goes through sox. WAV input is
//! already done, and anything else is left alone.

use std::sync::Arc;

use async_trait::async_trait;

use super::job::{ensure_source_file, ConversionJob, ConversionResult, Converter, Format};
use super::tool::{check_status, print_preview, ToolCommand, ToolRunner};
use crate::audio::lowercase_extension;
use crate::core::Settings;
use crate::error::Result;

pub struct ToWav {
    runner: Arc<dyn ToolRunner>,
    flac: String,
    sox: String,
    options: Vec<String>,
}

impl ToWav {
    pub fn from_settings(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            flac: settings.tools.flac.clone(),
            sox: settings.tools.sox.clone(),
            options: settings.extra_options(Format::Wav).to_vec(),
        }
    }

    /// Command for `job`, or `None` when there is nothing to run
    pub fn build_command(&self, job: &ConversionJob) -> Option<ToolCommand> {
        let path = &job.source_path;
        match lowercase_extension(path).as_deref() {
            Some("flac") => Some(
                ToolCommand::new(&self.flac)
                    .arg("-d")
                    .args(&self.options)
                    .arg(path),
            ),
            Some("mp3") => Some(
                ToolCommand::new(&self.sox)
                    .args(&self.options)
                    .arg(path)
                    .arg(path.with_extension("wav")),
            ),
            Some("wav") => None,
            other => {
                log::warn!(
                    "Don't know how to handle filetype ({}): {}",
                    other.unwrap_or(""),
                    path.display()
                );
                None
            }
        }
    }
}

#[async_trait]
impl Converter for ToWav {
    fn output_format(&self) -> Format {
        Format::Wav
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConversionResult> {
        ensure_source_file(&job.source_path).await?;

        let Some(command) = self.build_command(job) else {
            return Ok(ConversionResult::skipped(&job.source_path));
        };

        println!("-> WAV: {}", job.source_path.display());
        if job.preview {
            print_preview(&command);
            return Ok(ConversionResult::finished(&job.source_path, vec![command], true));
        }

        let outcome = self.runner.run(&command).await;
        let success = check_status(&command, &outcome);
        Ok(ConversionResult::finished(&job.source_path, vec![command], success))
    }
}
