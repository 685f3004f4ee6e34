//! Test fixtures for conversion tests
//!
//! Provides a fake [`ToolRunner`] that records what would have been run, and
//! helpers for building scratch source trees.

#![cfg(test)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::conversion::{ToolCommand, ToolOutput, ToolRunner};
use crate::error::Result;

/// Records every command and answers with a canned exit code and stdout
#[derive(Debug, Default)]
pub struct RecordingRunner {
    default_code: i32,
    codes: HashMap<String, i32>,
    /// Per-program exit codes consumed one call at a time
    sequences: Mutex<HashMap<String, VecDeque<i32>>>,
    stdout: String,
    /// Create the file named after `-o` on success, like flac does
    write_outputs: bool,
    delay: Option<Duration>,
    commands: Mutex<Vec<ToolCommand>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(code: i32) -> Self {
        Self {
            default_code: code,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn with_exit_code_for(mut self, program: &str, code: i32) -> Self {
        self.codes.insert(program.to_string(), code);
        self
    }

    /// Answer successive calls to `program` with `codes`, then fall back
    pub fn with_exit_code_sequence(self, program: &str, codes: &[i32]) -> Self {
        self.sequences
            .lock()
            .unwrap()
            .insert(program.to_string(), codes.iter().copied().collect());
        self
    }

    pub fn writing_outputs(mut self) -> Self {
        self.write_outputs = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Commands run for `program`, in order
    pub fn commands_for(&self, program: &str) -> Vec<ToolCommand> {
        self.commands()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.commands.lock().unwrap().push(command.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self
            .sequences
            .lock()
            .unwrap()
            .get_mut(&command.program)
            .and_then(|codes| codes.pop_front());
        let code = scripted
            .or_else(|| self.codes.get(&command.program).copied())
            .unwrap_or(self.default_code);

        if self.write_outputs && code == 0 {
            let args = command.arg_strings();
            if let Some(pos) = args.iter().position(|a| a == "-o") {
                if let Some(out) = args.get(pos + 1) {
                    std::fs::write(out, b"RIFF").unwrap();
                }
            }
        }

        Ok(ToolOutput {
            code: Some(code),
            stdout: self.stdout.clone(),
            stderr: if code == 0 {
                String::new()
            } else {
                "simulated failure".to_string()
            },
        })
    }
}

/// Create `relative` (and its parents) under `root` with dummy contents
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"data").unwrap();
    path
}

/// All files beneath `root`, relative to it, sorted
pub fn list_tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
