//! Audio conversion module
//!
//! Builds and runs the external codec commands for each job, and schedules
//! jobs across a worker pool.

mod flac;
mod job;
mod mp3;
mod output_manager;
mod parallel;
mod tool;
mod wav;

pub use flac::is_reencoded_copy;
pub use job::{ConversionJob, ConverterSet, Format};
pub use output_manager::DoneTree;
pub use parallel::{
    calculate_worker_count, detected_cpus, JobScheduler, RunSummary, SchedulerConfig,
};
pub use tool::{SystemRunner, ToolCommand, ToolRunner};
#[cfg(test)]
pub use tool::ToolOutput;

use crate::core::ToolPaths;

/// Check that each configured tool can be found.
///
/// Returns the tools that could not be resolved. Missing tools are not fatal,
/// the jobs that need them fail on their own.
pub fn verify_tools(tools: &ToolPaths) -> Vec<String> {
    let mut missing = Vec::new();
    for program in [&tools.flac, &tools.lame, &tools.sox] {
        match which::which(program) {
            Ok(path) => log::debug!("{} found at {}", program, path.display()),
            Err(e) => {
                log::warn!("{} not found: {}", program, e);
                missing.push(program.clone());
            }
        }
    }
    missing
}
