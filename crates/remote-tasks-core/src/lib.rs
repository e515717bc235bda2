//! Core abstractions for the remote task client.
//!
//! This crate provides the fundamental building blocks:
//! - `Config` - Resolved client configuration
//! - `ProjectSnapshot` - Directory inventory sent on handshake and on request
//! - `LoopEvent` / `LoopObserver` - Observable session events
//! - Transport and task runner traits

pub mod config;
pub mod observer;
pub mod snapshot;
pub mod traits;

pub use config::{Config, ConfigError};
pub use observer::{LoopEvent, LoopObserver, Termination, TracingObserver};
pub use snapshot::{ProjectSnapshot, SnapshotMetrics};
pub use traits::{TaskRunner, Transport, TransportError};
