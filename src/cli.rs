use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::core::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Print what would be done, change nothing
    Preview,
    /// Convert and move files
    Go,
}

/// Batch conversion of audio files
///
/// Put files in the folders 2wav, 2mp3 and 2flac; each folder's contents are
/// converted to its format. Tags come from the files themselves and from the
/// folder layout genre/artist/year-album/track-title.
#[derive(Parser, Debug)]
#[command(name = "batchconvert")]
#[command(version)]
pub struct Args {
    #[arg(value_enum)]
    pub command: RunMode,

    /// Adjustment to the default number of jobs (CPU count)
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    pub jobs_adjustment: Option<i32>,

    /// Directory containing the source folders
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Where processed sources are moved
    #[arg(long)]
    pub done_dir: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show debug output on the terminal
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn preview(&self) -> bool {
        self.command == RunMode::Preview
    }

    /// Apply command-line overrides on top of loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(adjustment) = self.jobs_adjustment {
            settings.jobs_adjustment = adjustment;
        }
        if let Some(base_dir) = &self.base_dir {
            settings.base_dir = base_dir.clone();
        }
        if let Some(done_dir) = &self.done_dir {
            settings.done_dir = done_dir.clone();
        }
    }
}
