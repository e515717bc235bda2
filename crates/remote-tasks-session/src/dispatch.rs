//! Descriptor classification.

use remote_tasks_core::Config;

/// What an inbound descriptor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// End the session without replying.
    Exit,
    /// Reply with a project snapshot.
    Info,
    /// Hand the descriptor to the task runner.
    Task,
}

impl Dispatch {
    /// Classify `descriptor`. The exit token matches in any letter case, the
    /// info token only exactly.
    #[must_use]
    pub fn classify(descriptor: &str, config: &Config) -> Self {
        if descriptor.eq_ignore_ascii_case(&config.exit_token) {
            Self::Exit
        } else if descriptor == config.info_token {
            Self::Info
        } else {
            Self::Task
        }
    }
}
