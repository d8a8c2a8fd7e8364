//! Running a tool chain over files or standard input
//!
//! Implements the two ways a chain is applied:
//! - File mode: every tool gets the original file path as its last argument
//! - Stdin mode: each tool's stdout is piped to the next tool's stdin

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, warn};

use super::invoke::{run_tool, ToolInput};
use crate::error::{PipelineError, STDIN_TARGET};
use crate::tool::ToolChain;

/// A tool chain together with the environment its tools run in
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    chain: &'a ToolChain,
    env: &'a [(String, String)],
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(chain: &'a ToolChain) -> Self {
        Self { chain, env: &[] }
    }

    /// Extra environment variables set on every spawned tool
    #[must_use]
    pub fn with_env(mut self, env: &'a [(String, String)]) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn chain(&self) -> &ToolChain {
        self.chain
    }

    fn ensure_tools(&self) -> Result<(), PipelineError> {
        if self.chain.is_empty() {
            return Err(PipelineError::Configuration(
                "no formatters defined".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the chain in file mode and return the last tool's stdout.
    ///
    /// The file itself is never modified here.
    pub fn format_file(&self, path: &Path) -> Result<Vec<u8>, PipelineError> {
        self.ensure_tools()?;
        let target = path.display().to_string();
        let mut output = Vec::new();
        for tool in self.chain {
            output = run_tool(tool, ToolInput::Path(path), self.env, &target)?;
        }
        Ok(output)
    }

    /// Run the chain in stdin mode, piping `input` through every tool
    pub fn format_bytes(&self, input: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        self.ensure_tools()?;
        let mut buffer = input;
        for tool in self.chain {
            buffer = run_tool(tool, ToolInput::Bytes(&buffer), self.env, STDIN_TARGET)?;
        }
        Ok(buffer)
    }
}

/// Counts of targets that went through the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    fn record(&mut self, result: Result<(), PipelineError>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) => {
                error!("{e}");
                self.failed += 1;
            }
        }
    }
}

/// Run the chain over one file.
///
/// With `write_back` the file is truncated and rewritten with the final
/// output; otherwise the output is appended to `out`.
pub fn run_over_file<W: Write>(
    pipeline: &Pipeline<'_>,
    path: &Path,
    write_back: bool,
    out: &mut W,
) -> Result<(), PipelineError> {
    let formatted = process_target(pipeline, path, write_back)?;
    emit(path, formatted, out)
}

/// Run the chain over everything readable from `input`.
///
/// Write-back is rejected before `input` is read or any tool is spawned.
pub fn run_over_stdin<R: Read, W: Write>(
    pipeline: &Pipeline<'_>,
    mut input: R,
    write_back: bool,
    out: &mut W,
) -> Result<(), PipelineError> {
    if write_back {
        return Err(PipelineError::UnsupportedOperation(
            "cannot write to source when reading from standard input".to_string(),
        ));
    }
    pipeline.ensure_tools()?;

    let mut buffer = Vec::new();
    input
        .read_to_end(&mut buffer)
        .map_err(PipelineError::Stdin)?;

    let formatted = pipeline.format_bytes(buffer)?;
    out.write_all(&formatted)
        .and_then(|()| out.flush())
        .map_err(|source| PipelineError::Output {
            target: STDIN_TARGET.to_string(),
            source,
        })
}

/// Run the chain over every file, continuing past failures.
///
/// `jobs == 1` processes targets strictly one after another. Any other value
/// formats targets concurrently on a rayon pool (`0` picks the pool size
/// automatically), but output still reaches `out` in the order of `files`.
pub fn run_over_files<W: Write>(
    pipeline: &Pipeline<'_>,
    files: &[PathBuf],
    write_back: bool,
    jobs: usize,
    out: &mut W,
) -> RunSummary {
    if jobs == 1 || files.len() < 2 {
        return run_sequential(pipeline, files, write_back, out);
    }

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            warn!("failed to configure thread pool, running sequentially: {e}");
            return run_sequential(pipeline, files, write_back, out);
        }
    };

    debug!(
        "Formatting {} files on {} threads",
        files.len(),
        pool.current_num_threads()
    );

    let results: Vec<Result<Option<Vec<u8>>, PipelineError>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| process_target(pipeline, path, write_back))
            .collect()
    });

    let mut summary = RunSummary::default();
    for (path, result) in files.iter().zip(results) {
        summary.record(result.and_then(|formatted| emit(path, formatted, out)));
    }
    summary
}

fn run_sequential<W: Write>(
    pipeline: &Pipeline<'_>,
    files: &[PathBuf],
    write_back: bool,
    out: &mut W,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for path in files {
        summary.record(run_over_file(pipeline, path, write_back, out));
    }
    summary
}

/// Format one target. Returns the bytes still to be printed, if any.
fn process_target(
    pipeline: &Pipeline<'_>,
    path: &Path,
    write_back: bool,
) -> Result<Option<Vec<u8>>, PipelineError> {
    let formatted = pipeline.format_file(path)?;
    if write_back {
        write_to_source(path, &formatted)?;
        Ok(None)
    } else {
        Ok(Some(formatted))
    }
}

fn emit<W: Write>(
    path: &Path,
    formatted: Option<Vec<u8>>,
    out: &mut W,
) -> Result<(), PipelineError> {
    let Some(formatted) = formatted else {
        return Ok(());
    };
    out.write_all(&formatted)
        .and_then(|()| out.flush())
        .map_err(|source| PipelineError::Output {
            target: path.display().to_string(),
            source,
        })
}

/// Replace the file content in place. Not atomic: a crash mid-write leaves
/// a truncated file.
fn write_to_source(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let io_error = |op: &'static str| {
        move |source: std::io::Error| PipelineError::FileIo {
            op,
            path: path.to_path_buf(),
            source,
        }
    };

    let mut file = File::create(path).map_err(io_error("create"))?;
    file.write_all(contents).map_err(io_error("write"))?;
    file.sync_all().map_err(io_error("sync"))?;
    Ok(())
}
