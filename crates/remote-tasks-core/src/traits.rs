//! Core traits for transport and task execution.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Send failed: {0}")]
    Send(#[source] std::io::Error),
    #[error("Receive failed: {0}")]
    Receive(#[source] std::io::Error),
    #[error("Received invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Not connected")]
    NotConnected,
}

impl TransportError {
    /// Whether the error means the connection can no longer be used.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Closed | Self::NotConnected)
    }
}

/// A connected, bidirectional text channel to the controller.
#[async_trait]
pub trait Transport: Send {
    /// Write `payload` as UTF-8.
    async fn send(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Read at most `max_bytes` bytes and decode them as UTF-8.
    async fn receive(&mut self, max_bytes: usize) -> Result<String, TransportError>;

    /// Release the connection. Calling it more than once is harmless.
    async fn close(&mut self);
}

/// Something that turns a task descriptor into result text.
#[async_trait]
pub trait TaskRunner: Send {
    /// Execute one descriptor and return its output.
    ///
    /// Failures are reported in the returned text, never as an error.
    async fn execute(&mut self, descriptor: &str) -> String;

    /// Directory tasks currently run in.
    fn working_dir(&self) -> &Path;
}
