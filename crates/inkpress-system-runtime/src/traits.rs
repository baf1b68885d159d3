/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait and supporting types for running
 * external tools.
 *
 * The build pipeline never spawns processes directly. It goes through this
 * trait, so tests can substitute a recording runtime for `git` and
 * `latexmk`.
 */

use std::io;
use std::path::Path;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// The requested program could not be found
    CommandNotFound(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::CommandNotFound(command) => {
                write!(f, "Command not found: {}", command)
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

/// Output from a command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (0 = success, -1 if terminated by a signal)
    pub code: i32,
    /// Standard output
    pub stdout: Vec<u8>,
    /// Standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Get stdout as a string (lossy UTF-8 conversion)
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as a string (lossy UTF-8 conversion)
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout followed by stderr, for error reports.
    pub fn combined_output(&self) -> String {
        let mut combined = self.stdout_string();
        let stderr = self.stderr_string();
        if !combined.is_empty() && !stderr.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
        combined
    }
}

/// Trait for executing external programs.
///
/// Implementations run exactly the program they are asked to run, with the
/// given arguments, in the given working directory (or the process's
/// current directory when `cwd` is `None`). A non-zero exit status is not an
/// error at this level; callers inspect [`CommandOutput::code`].
pub trait SystemRuntime: Send + Sync {
    /// Execute command with full output capture.
    fn exec_command(
        &self,
        command: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> RuntimeResult<CommandOutput>;

    /// Name of the runtime, for logging.
    fn name(&self) -> &'static str;
}
