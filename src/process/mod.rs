//! Tool chain execution.
//!
//! This module runs the configured [`ToolChain`](crate::tool::ToolChain) over
//! each target:
//!
//! **File mode:**
//! - Every tool is invoked as `command args... <path>` and reads the file itself
//! - The file is not touched between tools; only the last tool's stdout counts
//! - The result goes to stdout, or back into the file with write-back
//!
//! **Stdin mode:**
//! - Standard input is read once and piped to the first tool
//! - Each tool's stdout becomes the next tool's stdin
//! - Write-back is rejected because there is no file to write to
//!
//! Tool stderr always streams straight through to our stderr. A failing tool
//! stops the chain for its target only.

mod invoke;
pub mod pipeline;

pub use pipeline::{run_over_file, run_over_files, run_over_stdin, Pipeline, RunSummary};
