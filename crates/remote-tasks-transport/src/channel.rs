//! Stream channel to the controller.

use async_trait::async_trait;
use remote_tasks_core::{Config, Transport, TransportError};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

/// Lifecycle of a channel's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected.
    Disconnected,
    /// Stream is live.
    Connected,
    /// Stream was released.
    Closed,
}

/// Owns exactly one connection to the controller.
///
/// Dropping the channel releases the stream, so an early return never leaks
/// the socket.
#[derive(Debug)]
pub struct Channel<S> {
    stream: Option<S>,
    state: ConnectionState,
    peer: String,
    /// Start of a character cut off by the previous read.
    pending: Vec<u8>,
}

/// Channel over TCP.
pub type TcpChannel = Channel<TcpStream>;

impl Channel<TcpStream> {
    /// Connect to the controller named in `config`.
    ///
    /// # Errors
    /// Returns `TransportError::Connect` if the connection cannot be made.
    pub async fn open(config: &Config) -> Result<Self, TransportError> {
        let addr = config.address();
        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!(%addr, "Connected to controller");
        Ok(Self::from_stream(stream, addr))
    }
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream.
    #[must_use]
    pub fn from_stream(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            state: ConnectionState::Connected,
            peer: peer.into(),
            pending: Vec::new(),
        }
    }

    /// A channel that was never opened.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            stream: None,
            state: ConnectionState::Disconnected,
            peer: String::new(),
            pending: Vec::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Address of the controller.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn stream_mut(&mut self) -> Result<&mut S, TransportError> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl<S> Transport for Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, payload: &str) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;
        stream
            .write_all(payload.as_bytes())
            .await
            .map_err(TransportError::Send)?;
        stream.flush().await.map_err(TransportError::Send)?;
        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize) -> Result<String, TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut buf = std::mem::take(&mut self.pending);
        loop {
            let start = buf.len();
            let want = max_bytes.saturating_sub(start).max(1);
            buf.resize(start + want, 0);
            let n = stream
                .read(&mut buf[start..])
                .await
                .map_err(TransportError::Receive)?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            buf.truncate(start + n);

            // A read that ends inside a character hands back the complete
            // prefix and keeps the cut bytes for the next call.
            let err = match String::from_utf8(buf) {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };
            if err.utf8_error().error_len().is_some() {
                return Err(err.into());
            }
            let valid = err.utf8_error().valid_up_to();
            let mut bytes = err.into_bytes();
            let tail = bytes.split_off(valid);
            if valid > 0 {
                self.pending = tail;
                return Ok(String::from_utf8(bytes)?);
            }
            buf = tail;
        }
    }

    async fn close(&mut self) {
        self.pending.clear();
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        if let Err(e) = stream.shutdown().await {
            tracing::debug!("Shutdown on close failed: {e}");
        }
        self.state = ConnectionState::Closed;
        tracing::info!(peer = %self.peer, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use tokio_test::io::Builder;

    use super::*;

    #[tokio::test]
    async fn test_receive_decodes_text() {
        let mock = Builder::new().read(b"whoami").build();
        let mut channel = Channel::from_stream(mock, "mock");

        assert_eq!(channel.receive(1024).await.unwrap(), "whoami");
    }

    #[tokio::test]
    async fn test_receive_truncates_to_max_bytes() {
        let mock = Builder::new().read(b"abcdef").build();
        let mut channel = Channel::from_stream(mock, "mock");

        assert_eq!(channel.receive(4).await.unwrap(), "abcd");
        assert_eq!(channel.receive(4).await.unwrap(), "ef");
    }

    #[tokio::test]
    async fn test_receive_eof_is_closed() {
        let mock = Builder::new().build();
        let mut channel = Channel::from_stream(mock, "mock");

        let err = channel.receive(16).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_receive_invalid_utf8() {
        let mock = Builder::new().read(&[0xff, 0xfe, 0xfd]).build();
        let mut channel = Channel::from_stream(mock, "mock");

        let err = channel.receive(16).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUtf8(_)));
        assert!(!err.is_disconnect());
    }

    #[tokio::test]
    async fn test_receive_keeps_split_character_for_next_read() {
        let mock = Builder::new().read("abé".as_bytes()).build();
        let mut channel = Channel::from_stream(mock, "mock");

        assert_eq!(channel.receive(3).await.unwrap(), "ab");
        assert_eq!(channel.receive(3).await.unwrap(), "é");
    }

    #[tokio::test]
    async fn test_receive_buffer_smaller_than_character() {
        let mock = Builder::new().read("é!".as_bytes()).build();
        let mut channel = Channel::from_stream(mock, "mock");

        assert_eq!(channel.receive(1).await.unwrap(), "é");
        assert_eq!(channel.receive(1).await.unwrap(), "!");
    }

    #[tokio::test]
    async fn test_receive_invalid_after_valid_prefix() {
        let mock = Builder::new().read(&[b'o', b'k', 0xff, b'x']).build();
        let mut channel = Channel::from_stream(mock, "mock");

        let err = channel.receive(16).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUtf8(_)));
    }

    #[tokio::test]
    async fn test_receive_io_error() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut channel = Channel::from_stream(mock, "mock");

        let err = channel.receive(16).await.unwrap_err();
        assert!(matches!(err, TransportError::Receive(_)));
    }

    #[tokio::test]
    async fn test_send_writes_payload() {
        let mock = Builder::new().write(b"out<sep>/tmp").build();
        let mut channel = Channel::from_stream(mock, "mock");

        channel.send("out<sep>/tmp").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_error() {
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"))
            .build();
        let mut channel = Channel::from_stream(mock, "mock");

        let err = channel.send("data").await.unwrap_err();
        assert!(matches!(err, TransportError::Send(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = Builder::new().build();
        let mut channel = Channel::from_stream(mock, "mock");
        assert_eq!(channel.state(), ConnectionState::Connected);

        channel.close().await;
        assert_eq!(channel.state(), ConnectionState::Closed);
        channel.close().await;
        assert_eq!(channel.state(), ConnectionState::Closed);

        let err = channel.send("late").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_close_never_opened() {
        let mut channel = TcpChannel::disconnected();
        channel.close().await;
        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert!(channel.receive(8).await.unwrap_err().is_disconnect());
    }

    #[tokio::test]
    async fn test_open_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = Config {
            port,
            ..Config::default()
        };
        let err = TcpChannel::open(&config).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_open_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = Config {
            port,
            ..Config::default()
        };

        let (channel, accepted) = tokio::join!(TcpChannel::open(&config), listener.accept());
        let mut channel = channel.unwrap();
        let (mut peer, _) = accepted.unwrap();
        assert_eq!(channel.state(), ConnectionState::Connected);
        assert_eq!(channel.peer(), config.address());

        channel.send("ping").await.unwrap();
        let mut buf = [0u8; 4];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        channel.close().await;
        assert_eq!(peer.read(&mut buf).await.unwrap(), 0);
    }
}
