/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Native runtime backed by std::process.
 */

use std::io;
use std::path::Path;
use std::process::Command;

use crate::traits::{CommandOutput, RuntimeError, RuntimeResult, SystemRuntime};

/// Runtime with full system access.
///
/// Child processes inherit the environment of the current process.
#[derive(Debug, Clone, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl SystemRuntime for NativeRuntime {
    fn exec_command(
        &self,
        command: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> RuntimeResult<CommandOutput> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(command, ?args, cwd = ?cwd, "spawning process");

        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RuntimeError::CommandNotFound(command.to_string()),
            _ => RuntimeError::Io(e),
        })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
