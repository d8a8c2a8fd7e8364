//! Spawning a single tool and capturing its output.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;

use tracing::debug;

use crate::error::PipelineError;
use crate::tool::Tool;

/// How the tool receives the content it formats
#[derive(Debug, Clone, Copy)]
pub(crate) enum ToolInput<'a> {
    /// The file path is appended as the last argument; stdin is closed
    Path(&'a Path),
    /// The bytes are piped to the tool's stdin
    Bytes(&'a [u8]),
}

/// Run `tool` to completion and return its captured stdout.
///
/// The tool's stderr is inherited so diagnostics reach the user while the
/// tool runs.
pub(crate) fn run_tool(
    tool: &Tool,
    input: ToolInput<'_>,
    env: &[(String, String)],
    target: &str,
) -> Result<Vec<u8>, PipelineError> {
    let mut cmd = Command::new(tool.command());
    cmd.args(tool.arguments())
        .envs(env.iter().map(|(key, value)| (key, value)))
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    match input {
        ToolInput::Path(path) => {
            debug!(
                "Running tool `{}' with {:?} {}",
                tool.command(),
                tool.arguments(),
                path.display()
            );
            cmd.arg(path).stdin(Stdio::null());
        }
        ToolInput::Bytes(_) => {
            debug!(
                "Running tool `{}' with {:?} (STDIN)",
                tool.command(),
                tool.arguments()
            );
            cmd.stdin(Stdio::piped());
        }
    }

    let launch_error = |source: io::Error| PipelineError::ToolLaunch {
        tool: tool.to_string(),
        target: target.to_string(),
        source,
    };

    let mut child = cmd.spawn().map_err(launch_error)?;

    let output = match (input, child.stdin.take()) {
        (ToolInput::Bytes(bytes), Some(mut stdin)) => {
            thread::scope(|scope| -> Result<Output, PipelineError> {
                // Feed stdin on its own thread so a tool that writes before it
                // finishes reading cannot fill the stdout pipe and stall us.
                let writer = scope.spawn(move || stdin.write_all(bytes));
                let output = child.wait_with_output().map_err(launch_error)?;
                match writer.join().unwrap_or(Ok(())) {
                    Ok(()) => {}
                    // The tool stopped reading early; its exit status decides
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    Err(source) => {
                        return Err(PipelineError::ToolInput {
                            tool: tool.to_string(),
                            target: target.to_string(),
                            source,
                        })
                    }
                }
                Ok(output)
            })?
        }
        _ => child.wait_with_output().map_err(launch_error)?,
    };

    if !output.status.success() {
        return Err(PipelineError::ToolExit {
            tool: tool.to_string(),
            target: target.to_string(),
            status: output.status,
        });
    }

    Ok(output.stdout)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn tool(command: &str, args: &[&str]) -> Tool {
        Tool::new(command, args.iter().copied()).unwrap()
    }

    #[test]
    fn test_bytes_are_piped() {
        let out = run_tool(&tool("cat", &[]), ToolInput::Bytes(b"hello"), &[], "t").unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_large_input_does_not_deadlock() {
        let input = vec![b'a'; 1024 * 1024];
        let out = run_tool(&tool("cat", &[]), ToolInput::Bytes(&input), &[], "t").unwrap();
        assert_eq!(out.len(), input.len());
    }

    #[test]
    fn test_tool_that_ignores_stdin() {
        let input = vec![b'a'; 1024 * 1024];
        let out = run_tool(
            &tool("sh", &["-c", "printf done"]),
            ToolInput::Bytes(&input),
            &[],
            "t",
        )
        .unwrap();
        assert_eq!(out, b"done");
    }

    #[test]
    fn test_env_is_passed() {
        let env = vec![("MULTIFMT_TEST_VALUE".to_string(), "42".to_string())];
        let out = run_tool(
            &tool("sh", &["-c", "printf %s \"$MULTIFMT_TEST_VALUE\""]),
            ToolInput::Bytes(b""),
            &env,
            "t",
        )
        .unwrap();
        assert_eq!(out, b"42");
    }

    #[test]
    fn test_non_zero_exit() {
        let err = run_tool(&tool("false", &[]), ToolInput::Bytes(b""), &[], "a.go").unwrap_err();
        assert!(matches!(err, PipelineError::ToolExit { ref target, .. } if target == "a.go"));
    }

    #[test]
    fn test_missing_command() {
        let err = run_tool(
            &tool("multifmt-no-such-tool", &[]),
            ToolInput::Bytes(b""),
            &[],
            "a.go",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::ToolLaunch { .. }));
        assert_eq!(err.tool(), Some("multifmt-no-such-tool"));
    }
}
