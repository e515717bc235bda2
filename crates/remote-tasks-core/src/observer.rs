//! Events emitted by the command loop and the observers that consume them.

use serde::Serialize;

/// Longest descriptor prefix written to logs.
const LOG_PREVIEW_CHARS: usize = 50;

/// Why the command loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "failures", rename_all = "snake_case")]
pub enum Termination {
    /// The controller sent the exit token.
    ExitRequested,
    /// The controller closed the connection.
    ConnectionClosed,
    /// Too many consecutive reads failed.
    ReceiveFailures(u32),
}

/// Notable moments in the life of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// Handshake snapshot was written.
    HandshakeSent { bytes: usize },
    /// A descriptor arrived.
    Received { descriptor: String },
    /// A read failed and was skipped.
    ReceiveFailed { error: String, consecutive: u32 },
    /// A descriptor was dispatched and produced a result.
    TaskExecuted { descriptor: String },
    /// A response was written.
    Sent { bytes: usize },
    /// A write failed; the loop carries on.
    SendFailed { error: String },
    /// The loop stopped.
    Terminated { termination: Termination },
}

/// Receives loop events.
pub trait LoopObserver: Send {
    fn on_event(&mut self, event: &LoopEvent);
}

/// Observer that writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LoopObserver for TracingObserver {
    fn on_event(&mut self, event: &LoopEvent) {
        match event {
            LoopEvent::HandshakeSent { bytes } => {
                tracing::info!(bytes, "Sent handshake snapshot");
            }
            LoopEvent::Received { descriptor } => {
                tracing::info!(descriptor = %preview(descriptor), "Received task");
            }
            LoopEvent::ReceiveFailed { error, consecutive } => {
                tracing::error!(consecutive, "Receive error: {error}");
            }
            LoopEvent::TaskExecuted { descriptor } => {
                tracing::info!(descriptor = %preview(descriptor), "Task executed");
            }
            LoopEvent::Sent { bytes } => {
                tracing::debug!(bytes, "Sent response");
            }
            LoopEvent::SendFailed { error } => {
                tracing::error!("Send error: {error}");
            }
            LoopEvent::Terminated { termination } => {
                tracing::info!(?termination, "Command loop terminated");
            }
        }
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
