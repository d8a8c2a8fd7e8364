//! multifmt - Run a chain of external formatters over source files
//!
//! Resolves path arguments (with recursive `...` expansion and skipped
//! directory names) and pipes every file, or standard input, through an
//! ordered list of formatter commands.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod resolve;
pub mod tool;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{Config, FileSettings};
pub use error::{PathResolutionWarning, PipelineError, Result};
pub use process::{run_over_file, run_over_files, run_over_stdin, Pipeline, RunSummary};
pub use resolve::{resolve, Resolution, SkipSet};
pub use tool::{Tool, ToolChain};
