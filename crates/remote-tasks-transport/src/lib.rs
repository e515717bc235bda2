//! Transport layer for the remote task client.
//!
//! Provides:
//! - Wire framing (`<output><separator><cwd>`)
//! - Stream channel with a TCP constructor

pub mod channel;
pub mod protocol;

pub use channel::{Channel, ConnectionState, TcpChannel};
pub use protocol::{TaskResult, normalize_descriptor};
