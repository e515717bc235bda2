//! Task executor for the remote task client.
//!
//! Provides:
//! - `TaskExecutor` - `cd` handling and shell command execution
//! - Shell command building utilities
//! - Shell detection for Unix and Windows

pub mod command;
pub mod executor;
pub mod shell;

pub use command::ShellCommand;
pub use executor::{DirectoryChangeError, TaskExecutor};
pub use shell::{UnixShell, get_shell_command};
