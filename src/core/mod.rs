//! Core run configuration and job discovery
//!
//! This module contains:
//! - Settings loaded from disk and overridden from the command line
//! - Source folder scanning that turns files into conversion jobs

mod scanning;
mod state;

pub use scanning::ConversionDispatcher;
pub use state::{Settings, ToolPaths};
