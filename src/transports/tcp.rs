//! TCP transport for the headset stream server

use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::transport::{Connection, Transport};
use crate::{Result, StreamError};

/// Plain TCP client transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>> {
        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(StreamError::connect_failed(host, port, e)),
            Err(_) => {
                return Err(StreamError::ConnectTimeout { host: host.to_string(), port, timeout });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(host, port, error = %e, "Failed to set TCP_NODELAY");
        }
        debug!(host, port, peer = ?stream.peer_addr().ok(), "TCP connection established");

        Ok(Box::new(TcpConnection { stream }))
    }
}

struct TcpConnection {
    stream: TcpStream,
}

#[async_trait::async_trait]
impl Connection for TcpConnection {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "TCP shutdown failed");
        }
    }
}
