//! Parallel job execution using tokio
//!
//! Runs conversion jobs on a worker pool sized from the CPU count, then moves
//! each processed source into the done tree. Preview runs are sequential so
//! their printed output stays in job order.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use super::job::{ConversionJob, Converter, ConverterSet};
use super::output_manager::DoneTree;

/// Number of CPUs the host reports, at least 1
pub fn detected_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// CPU count plus `adjustment`, never below 1
pub fn calculate_worker_count(cpus: usize, adjustment: i32) -> usize {
    (cpus as i64 + adjustment as i64).max(1) as usize
}

/// How the scheduler runs its jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub workers: usize,
    /// Forces a single worker and in-order execution
    pub preview: bool,
    /// Move sources even when their conversion failed
    pub relocate_failed: bool,
}

impl SchedulerConfig {
    pub fn new(workers: usize, preview: bool, relocate_failed: bool) -> Self {
        Self {
            workers: if preview { 1 } else { workers.max(1) },
            preview,
            relocate_failed,
        }
    }
}

/// Progress tracking for a run
#[derive(Debug)]
pub struct ConversionProgress {
    pub completed: AtomicUsize,
    pub failed: AtomicUsize,
    pub relocated: AtomicUsize,
    pub total: usize,
}

impl ConversionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            relocated: AtomicUsize::new(0),
            total,
        }
    }

    pub fn increment_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn increment_failed(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn increment_relocated(&self) -> usize {
        self.relocated.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn relocated_count(&self) -> usize {
        self.relocated.load(Ordering::SeqCst)
    }

    /// Jobs finished so far, either way
    pub fn finished_count(&self) -> usize {
        self.completed_count() + self.failed_count()
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub relocated: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

pub struct JobScheduler {
    converters: ConverterSet,
    done_tree: DoneTree,
    config: SchedulerConfig,
}

impl JobScheduler {
    pub fn new(converters: ConverterSet, done_tree: DoneTree, config: SchedulerConfig) -> Self {
        Self {
            converters,
            done_tree,
            config,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.config.workers
    }

    /// Run every job once and wait for all of them
    pub async fn run(&self, jobs: Vec<ConversionJob>) -> RunSummary {
        let start = Instant::now();
        let progress = Arc::new(ConversionProgress::new(jobs.len()));

        if self.config.preview {
            for job in jobs {
                let converter = self.converters.get(job.format);
                process_job(converter, &self.done_tree, job, &progress, self.config).await;
            }
        } else {
            self.run_parallel(jobs, progress.clone()).await;
        }

        RunSummary {
            total: progress.total,
            succeeded: progress.completed_count(),
            failed: progress.failed_count(),
            relocated: progress.relocated_count(),
            elapsed: start.elapsed(),
        }
    }

    async fn run_parallel(&self, jobs: Vec<ConversionJob>, progress: Arc<ConversionProgress>) {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        log::info!(
            "Starting conversion: {} files with {} workers, done tree at {}",
            jobs.len(),
            self.config.workers,
            self.done_tree.root().display()
        );

        let mut futures = FuturesUnordered::new();

        for job in jobs {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                log::error!("Worker pool closed, not starting remaining jobs");
                break;
            };
            let converter = self.converters.get(job.format);
            let done_tree = self.done_tree.clone();
            let progress = progress.clone();
            let config = self.config;
            let source = job.source_path.clone();

            let handle = tokio::spawn(async move {
                process_job(converter, &done_tree, job, &progress, config).await;
                drop(permit);
            });
            futures.push(async move { (source, handle.await) });
        }

        while let Some((source, result)) = futures.next().await {
            if let Err(e) = result {
                // the job never got to count itself
                progress.increment_failed();
                log::error!("Job for {} aborted: {}", source.display(), e);
            }
        }
    }
}

/// Convert one job, then move its source into the done tree
async fn process_job(
    converter: Arc<dyn Converter>,
    done_tree: &DoneTree,
    job: ConversionJob,
    progress: &ConversionProgress,
    config: SchedulerConfig,
) {
    let name = display_name(&job.source_path);

    let success = match converter.convert(&job).await {
        Ok(result) => {
            log::debug!(
                "{}: {} command(s)",
                result.input_path.display(),
                result.commands.len()
            );
            result.success
        }
        Err(e) => {
            log::error!("{}", e);
            false
        }
    };

    if job.preview || (!success && !config.relocate_failed) {
        if !success && !job.preview {
            log::warn!("Leaving {} in place for the next run", job.source_path.display());
        }
        count_outcome(progress, success, &name);
        return;
    }

    // a job only completes once its source is out of the source folder
    let success = match done_tree.relocate(&job.source_path, &job.source_root).await {
        Ok(dest) => {
            progress.increment_relocated();
            log::debug!("Moved {} -> {}", job.source_path.display(), dest.display());
            success
        }
        Err(e) => {
            log::error!("{}", e);
            false
        }
    };
    count_outcome(progress, success, &name);
}

fn count_outcome(progress: &ConversionProgress, success: bool, name: &str) {
    if success {
        progress.increment_completed();
        log::info!("Completed ({}/{}): {}", progress.finished_count(), progress.total, name);
    } else {
        progress.increment_failed();
        log::warn!("Failed ({}/{}): {}", progress.finished_count(), progress.total, name);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
