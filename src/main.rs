//! batchconvert - batch conversion of audio files
//!
//! Converts everything found under the 2wav, 2mp3 and 2flac folders to the
//! matching format with flac, lame and sox, then moves each processed source
//! into the done tree.

mod audio;
mod cli;
mod conversion;
mod core;
mod error;
mod logging;
#[cfg(test)]
mod test_fixtures;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use crate::cli::Args;
use crate::conversion::{
    calculate_worker_count, detected_cpus, verify_tools, ConverterSet, DoneTree, JobScheduler,
    RunSummary, SchedulerConfig, SystemRunner, ToolRunner,
};
use crate::core::{ConversionDispatcher, Settings};
use crate::error::Result;

async fn run(args: &Args) -> Result<RunSummary> {
    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    args.apply_to(&mut settings);
    let preview = args.preview();

    let cpus = detected_cpus();
    let config = SchedulerConfig::new(
        calculate_worker_count(cpus, settings.jobs_adjustment),
        preview,
        settings.relocate_failed,
    );
    println!();
    println!("Num CPUs detected: {}", cpus);
    println!("Num jobs to use  : {}", config.workers);
    println!();

    if !preview {
        let missing = verify_tools(&settings.tools);
        if !missing.is_empty() {
            log::warn!("Jobs needing {} will fail", missing.join(", "));
        }
    }

    let jobs = ConversionDispatcher::new(&settings, preview).discover()?;
    println!();

    let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner);
    let scheduler = JobScheduler::new(
        ConverterSet::from_settings(&settings, runner),
        DoneTree::new(settings.done_root()),
        config,
    );
    Ok(scheduler.run(jobs).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    match run(&args).await {
        Ok(summary) => {
            println!();
            println!(
                "{} succeeded, {} failed, {} moved to done",
                summary.succeeded, summary.failed, summary.relocated
            );
            println!("Time taken: {:.1} seconds", summary.elapsed.as_secs_f64());
            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("\nERROR: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{list_tree, touch, RecordingRunner};

    fn settings_for(base: &std::path::Path) -> Settings {
        for name in ["2wav", "2mp3", "2flac"] {
            std::fs::create_dir_all(base.join(name)).unwrap();
        }
        Settings {
            base_dir: base.to_path_buf(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_mp3_job_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path());
        touch(dir.path(), "2mp3/Rock/TheBand/1999-GreatAlbum/03-GreatSong.wav");

        let jobs = ConversionDispatcher::new(&settings, false).discover().unwrap();
        let runner = Arc::new(RecordingRunner::succeeding());
        let scheduler = JobScheduler::new(
            ConverterSet::from_settings(&settings, runner.clone()),
            DoneTree::new(settings.done_root()),
            SchedulerConfig::new(4, false, settings.relocate_failed),
        );

        let summary = scheduler.run(jobs).await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.relocated, 1);

        let lame = runner.commands_for("lame");
        assert_eq!(lame.len(), 1);
        let args = lame[0].arg_strings();
        let pairs: Vec<(&str, &str)> = args
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        for expected in [
            ("--tt", "GreatSong"),
            ("--tn", "03"),
            ("--tl", "GreatAlbum"),
            ("--ty", "1999"),
            ("--ta", "TheBand"),
            ("--tg", "Rock"),
        ] {
            assert!(pairs.contains(&expected), "missing {:?}", expected);
        }
        assert!(!args.contains(&"--ti".to_string()));

        assert_eq!(
            list_tree(dir.path()),
            vec!["done/Rock/TheBand/1999-GreatAlbum/03-GreatSong.wav"]
        );
    }

    #[tokio::test]
    async fn test_preview_end_to_end_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path());
        touch(dir.path(), "2mp3/Album/01-One.wav");
        touch(dir.path(), "2flac/Album/01-One.wav");
        touch(dir.path(), "2flac/Album/02-Two.flac");
        touch(dir.path(), "2wav/Album/01-One.flac");
        let before = list_tree(dir.path());

        let jobs = ConversionDispatcher::new(&settings, true).discover().unwrap();
        let runner = Arc::new(RecordingRunner::succeeding());
        let scheduler = JobScheduler::new(
            ConverterSet::from_settings(&settings, runner.clone()),
            DoneTree::new(settings.done_root()),
            SchedulerConfig::new(8, true, false),
        );

        let summary = scheduler.run(jobs).await;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.relocated, 0);
        assert!(runner.commands().is_empty());
        assert_eq!(list_tree(dir.path()), before);
        assert!(!dir.path().join("done").exists());
    }
}
