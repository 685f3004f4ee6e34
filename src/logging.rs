//! Logging configuration for batchconvert
//!
//! Logs are written to both the terminal and a file under the local data
//! directory, e.g. `~/.local/share/batchconvert/logs/batchconvert.log`.

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const LOG_FILE: &str = "batchconvert.log";
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Get the log directory path
pub fn get_log_directory() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("batchconvert").join("logs"))
}

/// Get the current log file path
pub fn get_log_file_path() -> Option<PathBuf> {
    get_log_directory().map(|d| d.join(LOG_FILE))
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

/// Initialize the logging system
///
/// The terminal shows info and above (debug with `verbose`), the file always
/// captures debug. Returns the path to the log file on success.
pub fn init_logging(verbose: bool) -> Option<PathBuf> {
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let Some(log_dir) = get_log_directory() else {
        eprintln!("Warning: Could not determine log directory");
        init_terminal_only(term_level);
        return None;
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_terminal_only(term_level);
        return None;
    }

    let log_path = log_dir.join(LOG_FILE);

    // Rotate old log if it's too large
    if let Ok(metadata) = fs::metadata(&log_path) {
        if metadata.len() > MAX_LOG_SIZE {
            let _ = fs::rename(&log_path, log_dir.join(format!("{}.old", LOG_FILE)));
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            init_terminal_only(term_level);
            return None;
        }
    };

    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(term_level, log_config(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, log_config(), log_file),
    ];

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    log::debug!("=== batchconvert run started ===");
    log::debug!("Log file: {}", log_path.display());

    Some(log_path)
}

/// Terminal-only logging, used when the log file is unavailable
fn init_terminal_only(level: LevelFilter) {
    let loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let _ = CombinedLogger::init(loggers);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_is_inside_log_directory() {
        let (Some(dir), Some(file)) = (get_log_directory(), get_log_file_path()) else {
            return;
        };

        assert!(file.starts_with(&dir));
        assert!(file.to_string_lossy().ends_with(LOG_FILE));
        assert!(dir.to_string_lossy().contains("batchconvert"));
    }
}
