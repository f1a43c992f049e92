//! Transport traits for byte stream sources

use std::io;
use std::time::Duration;

use crate::Result;

/// Factory for connections to a frame server.
///
/// The receiver owns one transport and calls [`connect`](Transport::connect)
/// every time it enters the connecting state. Implementations must enforce
/// `timeout` themselves.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `host:port`.
    ///
    /// Returns:
    /// - `Ok(connection)` - Connected and ready to read
    /// - `Err(StreamError::Connect)` - Refused, unreachable or reset
    /// - `Err(StreamError::ConnectTimeout)` - No answer within `timeout`
    async fn connect(&self, host: &str, port: u16, timeout: Duration)
    -> Result<Box<dyn Connection>>;
}

/// One open byte stream.
///
/// `read` behaves like a socket read: it may return fewer bytes than asked
/// for, and `Ok(0)` means the peer closed the stream.
#[async_trait::async_trait]
pub trait Connection: Send {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the connection. Called exactly once, when draining.
    async fn close(&mut self);
}
