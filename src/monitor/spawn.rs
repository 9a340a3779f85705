// src/monitor/spawn.rs

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{PublinkError, Result};
use crate::types::{CommandLine, Invocation};

/// A running publisher process.
///
/// The child is spawned with `kill_on_drop(true)`, so dropping the handle
/// terminates it if it is still running.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    command: String,
    exit_code: Option<Option<i32>>,
}

/// Spawn the process described by `invocation` with stdout and stderr piped.
///
/// Fails with [`PublinkError::Spawn`] when the program cannot be launched
/// (not found, permission denied, bad working directory).
pub fn start(invocation: &Invocation) -> Result<ProcessHandle> {
    let rendered = invocation.command.to_string();
    let mut cmd = build_command(&invocation.command)?;

    if let Some(cwd) = &invocation.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&invocation.env);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| PublinkError::Spawn {
        command: rendered.clone(),
        source,
    })?;

    info!(cmd = %rendered, pid = ?child.id(), "started publisher process");

    Ok(ProcessHandle {
        child,
        command: rendered,
        exit_code: None,
    })
}

fn build_command(line: &CommandLine) -> Result<Command> {
    match line {
        // Build a shell command appropriate for the platform.
        CommandLine::Shell(s) => {
            let cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(s);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(s);
                c
            };
            Ok(cmd)
        }
        CommandLine::Argv(argv) => {
            let (program, args) = argv.split_first().ok_or_else(|| PublinkError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            })?;
            let mut c = Command::new(program);
            c.args(args);
            Ok(c)
        }
    }
}

impl ProcessHandle {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Wait for the process to exit and return its exit code (`None` when it
    /// was terminated by a signal).
    pub async fn wait(&mut self) -> Result<Option<i32>> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }

        let status = self.child.wait().await?;
        let code = status.code();
        info!(
            cmd = %self.command,
            exit_code = ?code,
            success = status.success(),
            "publisher process exited"
        );
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Kill the process unless it has already exited.
    pub async fn kill(&mut self) {
        if self.exit_code.is_some() {
            return;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(cmd = %self.command, ?status, "process already exited; nothing to kill");
                self.exit_code = Some(status.code());
            }
            Ok(None) => {
                info!(cmd = %self.command, "killing publisher process");
                if let Err(e) = self.child.kill().await {
                    warn!(cmd = %self.command, error = %e, "failed to kill child process");
                }
                self.exit_code = Some(None);
            }
            Err(e) => {
                warn!(cmd = %self.command, error = %e, "failed to query child status before kill");
            }
        }
    }
}
