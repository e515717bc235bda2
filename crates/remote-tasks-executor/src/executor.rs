//! Task executor: `cd` handling and shell commands.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use remote_tasks_core::TaskRunner;
use thiserror::Error;

use crate::command::ShellCommand;

/// Directory change error. Rendered as result text, never propagated.
#[derive(Debug, Error)]
pub enum DirectoryChangeError {
    /// `cd` was given no path.
    #[error("cd: missing directory operand")]
    MissingTarget,
    /// The path does not exist or cannot be read.
    #[error("cd: {path}: {source}")]
    Inaccessible {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The path exists but is not a directory.
    #[error("cd: {path}: Not a directory")]
    NotADirectory { path: String },
}

/// Runs task descriptors against a tracked working directory.
///
/// `cd` moves this executor's directory only; the process working directory
/// is never changed.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    working_dir: PathBuf,
}

impl TaskExecutor {
    /// Create an executor rooted at `working_dir`.
    #[must_use]
    pub const fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }

    /// Create an executor rooted at the process working directory.
    ///
    /// # Errors
    /// Returns error if the process working directory is unavailable.
    pub fn from_current_dir() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Execute one descriptor.
    ///
    /// `cd <path>` changes the working directory and returns an empty string,
    /// or the failure description if the path is unusable. Anything else runs
    /// through the shell. An empty or whitespace-only descriptor does nothing.
    pub async fn execute(&mut self, descriptor: &str) -> String {
        let mut tokens = descriptor.split_whitespace();
        let Some(first) = tokens.next() else {
            return String::new();
        };

        if first.eq_ignore_ascii_case("cd") {
            let target = tokens.collect::<Vec<_>>().join(" ");
            return match self.change_dir(&target) {
                Ok(()) => String::new(),
                Err(e) => e.to_string(),
            };
        }

        ShellCommand::new(descriptor, &self.working_dir).run().await
    }

    /// Directory commands run in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Change the working directory. Relative targets resolve against the
    /// current one; `~` expands to the home directory.
    ///
    /// # Errors
    /// Returns error if the target is missing, unreadable or not a directory.
    /// The working directory is left untouched in that case.
    pub fn change_dir(&mut self, target: &str) -> Result<(), DirectoryChangeError> {
        if target.is_empty() {
            return Err(DirectoryChangeError::MissingTarget);
        }

        let resolved = self.working_dir.join(expand_home(target));
        let inaccessible = |source| DirectoryChangeError::Inaccessible {
            path: target.to_string(),
            source,
        };

        let metadata = fs::metadata(&resolved).map_err(inaccessible)?;
        if !metadata.is_dir() {
            return Err(DirectoryChangeError::NotADirectory {
                path: target.to_string(),
            });
        }

        self.working_dir = resolved.canonicalize().map_err(inaccessible)?;
        tracing::debug!(dir = %self.working_dir.display(), "Changed working directory");
        Ok(())
    }
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn execute(&mut self, descriptor: &str) -> String {
        Self::execute(self, descriptor).await
    }

    fn working_dir(&self) -> &Path {
        Self::working_dir(self)
    }
}

fn expand_home(target: &str) -> PathBuf {
    let rest = if target == "~" {
        Some("")
    } else {
        target.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(target),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor_in(dir: &Path) -> TaskExecutor {
        TaskExecutor::new(dir.canonicalize().unwrap())
    }

    #[tokio::test]
    async fn test_cd_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("test_subdir");
        fs::create_dir(&sub).unwrap();
        let mut executor = executor_in(dir.path());

        let out = executor.execute(&format!("cd {}", sub.display())).await;
        assert_eq!(out, "");
        assert_eq!(executor.working_dir(), sub.canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_cd_missing_dir_keeps_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor_in(dir.path());
        let before = executor.working_dir().to_path_buf();

        let out = executor.execute("cd /nonexistent/path").await;
        assert!(out.contains("/nonexistent/path"));
        assert!(out.contains("No such file"));
        assert_eq!(executor.working_dir(), before);
    }

    #[tokio::test]
    async fn test_cd_into_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), "").unwrap();
        let mut executor = executor_in(dir.path());
        let before = executor.working_dir().to_path_buf();

        let out = executor.execute("cd plain.txt").await;
        assert_eq!(out, "cd: plain.txt: Not a directory");
        assert_eq!(executor.working_dir(), before);
    }

    #[tokio::test]
    async fn test_cd_is_case_insensitive_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        let mut executor = executor_in(dir.path());

        assert_eq!(executor.execute("CD nested").await, "");
        assert!(executor.working_dir().ends_with("nested"));

        assert_eq!(executor.execute("Cd ..").await, "");
        assert_eq!(executor.working_dir(), dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_cd_joins_tokens_with_single_space() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("my project")).unwrap();
        let mut executor = executor_in(dir.path());

        assert_eq!(executor.execute("cd   my    project").await, "");
        assert!(executor.working_dir().ends_with("my project"));
    }

    #[tokio::test]
    async fn test_cd_leaves_process_cwd_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("elsewhere")).unwrap();
        let mut executor = executor_in(dir.path());
        let process_cwd = std::env::current_dir().unwrap();

        assert_eq!(executor.execute("cd elsewhere").await, "");
        assert!(executor.working_dir().ends_with("elsewhere"));
        assert_eq!(std::env::current_dir().unwrap(), process_cwd);
    }

    #[tokio::test]
    async fn test_cd_without_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor_in(dir.path());
        assert_eq!(executor.execute("cd").await, "cd: missing directory operand");
    }

    #[tokio::test]
    async fn test_whitespace_descriptor_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor_in(dir.path());
        assert_eq!(executor.execute("").await, "");
        assert_eq!(executor.execute("  \t ").await, "");
    }

    #[tokio::test]
    async fn test_shell_command_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor_in(dir.path());
        assert_eq!(executor.execute("echo hello").await, "hello\n");
    }

    #[tokio::test]
    async fn test_shell_runs_in_changed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("work");
        fs::create_dir(&sub).unwrap();
        let mut executor = executor_in(dir.path());

        executor.execute("cd work").await;
        let out = executor.execute("pwd").await;
        assert_eq!(out.trim_end(), sub.canonicalize().unwrap().display().to_string());
    }

    #[tokio::test]
    async fn test_missing_executable_is_reported_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor_in(dir.path());
        let out = executor.execute("definitely-not-a-real-command-42").await;
        assert!(out.contains("definitely-not-a-real-command-42"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/src"), home.join("src"));
        }
        assert_eq!(expand_home("~other"), PathBuf::from("~other"));
        assert_eq!(expand_home("/tmp"), PathBuf::from("/tmp"));
    }
}
