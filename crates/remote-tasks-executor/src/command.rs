//! Shell command construction and execution.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::shell::get_shell_command;

/// A command line to run through the platform shell.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    /// Raw command line, passed to the shell untouched.
    pub line: String,
    /// Directory the shell starts in.
    pub working_dir: PathBuf,
}

impl ShellCommand {
    /// Create a new shell command.
    #[must_use]
    pub fn new<S: Into<String>>(line: S, working_dir: &Path) -> Self {
        Self {
            line: line.into(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Script handed to the shell, with stderr folded into stdout so both
    /// streams arrive in the order they were written.
    #[must_use]
    pub fn script(&self) -> String {
        if cfg!(windows) {
            format!("({}) 2>&1", self.line)
        } else {
            format!("exec 2>&1\n{}", self.line)
        }
    }

    /// Build the process command.
    #[must_use]
    pub fn build(&self) -> Command {
        let (shell, arg) = get_shell_command();
        let mut cmd = Command::new(shell);
        cmd.arg(arg)
            .arg(self.script())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run to completion and return the combined output.
    ///
    /// A non-zero exit status is not an error; whatever the command printed
    /// is the result. If the shell cannot be started the spawn error text is
    /// returned instead.
    pub async fn run(&self) -> String {
        match self.build().output().await {
            Ok(output) => {
                tracing::debug!(status = ?output.status, "Shell command finished");
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                text
            }
            Err(e) => {
                tracing::warn!(line = %self.line, "Failed to spawn shell: {e}");
                format!("failed to run command: {e}")
            }
        }
    }
}
