//! Session orchestration for the remote task client.
//!
//! Provides:
//! - `CommandLoop` - Receive, dispatch and answer descriptors
//! - `Dispatch` - Descriptor classification

pub mod command_loop;
pub mod dispatch;

pub use command_loop::{CommandLoop, LoopState, LoopSummary};
pub use dispatch::Dispatch;
