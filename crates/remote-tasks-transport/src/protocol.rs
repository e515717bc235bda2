//! Wire framing for client-controller messages.
//!
//! Inbound messages are bare descriptors. Outbound messages are
//! `<output><separator><cwd>`; the separator is not escaped and is assumed
//! not to appear in either part.

use std::path::Path;

/// Result of one task, framed for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Text produced by the task.
    pub output: String,
    /// Working directory at the time of framing.
    pub cwd: String,
}

impl TaskResult {
    /// Pair `output` with the given working directory.
    #[must_use]
    pub fn new(output: impl Into<String>, cwd: &Path) -> Self {
        Self {
            output: output.into(),
            cwd: cwd.display().to_string(),
        }
    }

    /// Encode as `<output><separator><cwd>`.
    #[must_use]
    pub fn frame(&self, separator: &str) -> String {
        format!("{}{separator}{}", self.output, self.cwd)
    }

    /// Split a framed message at the first separator.
    ///
    /// The client never parses frames; this is for controllers and tests.
    #[must_use]
    pub fn parse(message: &str, separator: &str) -> Option<Self> {
        let (output, cwd) = message.split_once(separator)?;
        Some(Self {
            output: output.to_string(),
            cwd: cwd.to_string(),
        })
    }
}

/// Strip one trailing line terminator (`\n` or `\r\n`) from an inbound
/// descriptor.
#[must_use]
pub fn normalize_descriptor(raw: &str) -> &str {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    raw.strip_suffix('\r').unwrap_or(raw)
}
