//! Conversion to MP3 with lame
//!
//! Tags come from the file itself when available, with gaps filled in from
//! the folder hierarchy. Any input format is handed to lame as-is.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::job::{ensure_source_file, ConversionJob, ConversionResult, Converter, Format};
use super::tool::{check_status, print_preview, ToolCommand, ToolRunner};
use crate::audio::{merge_tags, tags_from_file, tags_from_path, TagKey, TagSet};
use crate::core::Settings;
use crate::error::Result;

/// Options that replace the default quality setting
const QUALITY_OPTIONS: &[&str] = &["-V", "-b", "--preset", "--abr", "--cbr", "--vbr-new"];

pub struct ToMp3 {
    runner: Arc<dyn ToolRunner>,
    lame: String,
    sox: String,
    source_folder: String,
    quality: String,
    options: Vec<String>,
}

impl ToMp3 {
    pub fn from_settings(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            lame: settings.tools.lame.clone(),
            sox: settings.tools.sox.clone(),
            source_folder: settings.source_folder(Format::Mp3).to_string(),
            quality: settings.mp3_quality.clone(),
            options: settings.extra_options(Format::Mp3).to_vec(),
        }
    }

    /// lame flag for a tag, if lame knows it
    fn tag_flag(key: &TagKey) -> Option<&'static str> {
        match key {
            TagKey::Title => Some("--tt"),
            TagKey::Artist => Some("--ta"),
            TagKey::Album => Some("--tl"),
            TagKey::Date => Some("--ty"),
            TagKey::TrackNumber => Some("--tn"),
            TagKey::Genre => Some("--tg"),
            TagKey::Other(_) => None,
        }
    }

    fn overrides_quality(&self) -> bool {
        self.options
            .iter()
            .any(|o| QUALITY_OPTIONS.iter().any(|q| o.starts_with(q)))
    }

    pub fn build_command(&self, path: &Path, tags: &TagSet, cover: Option<&Path>) -> ToolCommand {
        let mut command = ToolCommand::new(&self.lame);
        if !self.overrides_quality() && !self.quality.is_empty() {
            command = command.arg(&self.quality);
        }
        for (key, value) in tags.iter() {
            if let Some(flag) = Self::tag_flag(key) {
                command = command.arg(flag).arg(value);
            }
        }
        if let Some(cover) = cover {
            command = command.arg("--ti").arg(cover);
        }
        command.args(&self.options).arg(path)
    }

    async fn resolve_tags(&self, job: &ConversionJob) -> TagSet {
        let from_path = tags_from_path(&job.source_path, &self.source_folder);
        if job.preview {
            // no tools run in preview, so embedded tags are unknown
            return from_path;
        }
        let embedded = tags_from_file(self.runner.as_ref(), &self.sox, &job.source_path).await;
        merge_tags(embedded, from_path)
    }
}

#[async_trait]
impl Converter for ToMp3 {
    fn output_format(&self) -> Format {
        Format::Mp3
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConversionResult> {
        ensure_source_file(&job.source_path).await?;
        println!("-> MP3: {}", job.source_path.display());

        let tags = self.resolve_tags(job).await;
        log::debug!("Tags for {}: {:?}", job.source_path.display(), tags);
        let command = self.build_command(&job.source_path, &tags, job.cover_image.as_deref());

        if job.preview {
            print_preview(&command);
            return Ok(ConversionResult::finished(&job.source_path, vec![command], true));
        }

        let outcome = self.runner.run(&command).await;
        let success = check_status(&command, &outcome);
        Ok(ConversionResult::finished(&job.source_path, vec![command], success))
    }
}
