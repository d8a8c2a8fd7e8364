//! Error types and result aliases for multifmt.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used at the application boundary
//! - [`PipelineError`]: Typed failures of configuration, tool invocation and target I/O
//! - [`PathResolutionWarning`]: Non-fatal problems found while resolving path arguments

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;

/// Display name used for the standard input target in messages
pub const STDIN_TARGET: &str = "<stdin>";

/// Failures raised while configuring or running a tool chain.
///
/// Every variant except [`PipelineError::Configuration`] is scoped to a single
/// target: the runner reports it and moves on to the next target.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("tool `{tool}' could not be started for {target}: {source}")]
    ToolLaunch {
        tool: String,
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to feed input to tool `{tool}' for {target}: {source}")]
    ToolInput {
        tool: String,
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("tool `{tool}' failed on {target}: {status}")]
    ToolExit {
        tool: String,
        target: String,
        status: ExitStatus,
    },

    #[error("unable to {op} file `{}': {source}", .path.display())]
    FileIo {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write output for {target}: {source}")]
    Output {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to read standard input: {0}")]
    Stdin(#[source] io::Error),
}

impl PipelineError {
    /// Name of the tool involved in the failure, if any
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::ToolLaunch { tool, .. }
            | Self::ToolInput { tool, .. }
            | Self::ToolExit { tool, .. } => Some(tool),
            _ => None,
        }
    }
}

/// A path argument that could not be resolved.
///
/// Resolution continues with the remaining arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolutionWarning {
    /// The argument as given by the user
    pub argument: String,
    /// Human readable reason
    pub reason: String,
}

impl PathResolutionWarning {
    pub(crate) fn new(argument: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            argument: argument.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for PathResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot resolve `{}': {}", self.argument, self.reason)
    }
}
