//! Shell selection for running task command lines.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Returns the shell program and the argument that introduces a command
/// string for the current platform.
///
/// Returns `(shell_program, shell_arg)` where:
/// - Windows: `("cmd", "/C")`
/// - Unix-like: the user's shell if it is POSIX-compatible, otherwise `sh`
#[must_use]
pub fn get_shell_command() -> (PathBuf, &'static str) {
    if cfg!(windows) {
        (PathBuf::from("cmd"), "/C")
    } else {
        UnixShell::current_shell().get_shell_command()
    }
}

/// Unix shell types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnixShell {
    Zsh(PathBuf),
    Bash(PathBuf),
    Sh(PathBuf),
    Other(PathBuf),
}

impl UnixShell {
    /// Get the shell path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Zsh(p) | Self::Bash(p) | Self::Sh(p) | Self::Other(p) => p,
        }
    }

    /// Whether the shell understands POSIX `sh` syntax.
    #[must_use]
    pub const fn is_posix(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Get the shell to run tasks with.
    ///
    /// Uses `$SHELL` when it names a POSIX shell, otherwise `/bin/sh`, or
    /// `sh` from `PATH` on systems without `/bin/sh`.
    #[must_use]
    pub fn current_shell() -> Self {
        if let Ok(shell) = std::env::var("SHELL") {
            if let Some(shell) = Self::from_path(Path::new(&shell)) {
                if shell.is_posix() {
                    return shell;
                }
                tracing::debug!(shell = %shell.path().display(), "Ignoring non-POSIX $SHELL");
            }
        }
        Self::fallback()
    }

    /// Create from a path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.is_absolute() && path.is_file() {
            let path_buf = path.to_path_buf();
            if path.file_name() == Some(OsStr::new("zsh")) {
                Some(Self::Zsh(path_buf))
            } else if path.file_name() == Some(OsStr::new("bash")) {
                Some(Self::Bash(path_buf))
            } else if path.file_name() == Some(OsStr::new("sh")) {
                Some(Self::Sh(path_buf))
            } else {
                Some(Self::Other(path_buf))
            }
        } else {
            None
        }
    }

    /// Get shell command tuple.
    #[must_use]
    pub fn get_shell_command(&self) -> (PathBuf, &'static str) {
        (self.path().to_path_buf(), "-c")
    }

    fn fallback() -> Self {
        let bin_sh = Path::new("/bin/sh");
        if bin_sh.is_file() {
            return Self::Sh(bin_sh.to_path_buf());
        }
        which::which("sh").map_or_else(|_| Self::Sh(bin_sh.to_path_buf()), Self::Sh)
    }
}
