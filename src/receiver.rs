//! Receiver task: connects, frames, decodes and reconnects
//!
//! One receiver owns one transport, one sink and one accumulation buffer and
//! runs as a single sequential loop:
//!
//! ```text
//! Disconnected ─start─▶ Connecting ─ok─▶ Streaming ─error─▶ Draining
//!                        ▲   │ fail                            │
//!                        │   └─backoff─┘                       │
//!                        └─────────────────────────────────────┘
//! ```
//!
//! Cancellation or a closed sink returns it to `Disconnected` from any state.

use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::{decode_header, decode_payload, payload_size};
use crate::config::StreamConfig;
use crate::sink::FrameSink;
use crate::transport::{Connection, Transport};
use crate::types::{ConnectionState, ReceiverStats, SensorFrame};
use crate::StreamError;

/// Why a streaming session ended.
#[derive(Debug)]
enum Interrupt {
    Cancelled,
    SinkClosed,
    /// Connection is no longer usable; drain and reconnect.
    Failed(StreamError),
}

impl From<StreamError> for Interrupt {
    fn from(err: StreamError) -> Self {
        Interrupt::Failed(err)
    }
}

/// State machine driving one stream.
pub(crate) struct StreamReceiver<T, S> {
    config: StreamConfig,
    transport: T,
    sink: S,
    cancel: CancellationToken,
    stats: ReceiverStats,
    stats_tx: watch::Sender<ReceiverStats>,
    buffer: Vec<u8>,
}

impl<T, S> StreamReceiver<T, S>
where
    T: Transport,
    S: FrameSink,
{
    pub(crate) fn new(
        config: StreamConfig,
        transport: T,
        sink: S,
        cancel: CancellationToken,
        stats_tx: watch::Sender<ReceiverStats>,
    ) -> Self {
        let buffer = Vec::with_capacity(config.header_shape.size());
        Self { config, transport, sink, cancel, stats: ReceiverStats::default(), stats_tx, buffer }
    }

    /// Run until cancelled or the sink closes. Returns the final stats.
    pub(crate) async fn run(mut self) -> ReceiverStats {
        let endpoint = self.config.endpoint();
        info!(%endpoint, shape = self.config.header_shape.size(), "Stream receiver started");

        while let Some(mut connection) = self.connect().await {
            match self.stream(&mut *connection).await {
                Interrupt::Failed(err) => self.drain(connection, err).await,
                Interrupt::Cancelled => {
                    info!(%endpoint, "Stream receiver cancelled");
                    connection.close().await;
                    break;
                }
                Interrupt::SinkClosed => {
                    info!(%endpoint, "Frame sink closed, stopping receiver");
                    connection.close().await;
                    break;
                }
            }
        }

        self.buffer.clear();
        self.set_state(ConnectionState::Disconnected);
        info!(
            %endpoint,
            frames = self.stats.frames_yielded,
            reconnects = self.stats.reconnects,
            "Stream receiver ended"
        );
        self.stats
    }

    /// Connect with backoff until a connection opens. `None` when cancelled.
    async fn connect(&mut self) -> Option<Box<dyn Connection>> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            self.set_state(ConnectionState::Connecting);

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                result = self.transport.connect(
                    &self.config.host,
                    self.config.port,
                    self.config.connect_timeout,
                ) => result,
            };

            match result {
                Ok(connection) => {
                    self.stats.consecutive_connect_failures = 0;
                    self.set_state(ConnectionState::Streaming);
                    info!(
                        host = %self.config.host,
                        port = self.config.port,
                        "Connected to stream server"
                    );
                    return Some(connection);
                }
                Err(err) => {
                    self.stats.connect_failures += 1;
                    self.stats.consecutive_connect_failures += 1;
                    self.stats.last_error = Some(err.to_string());
                    self.publish();
                    warn!(
                        host = %self.config.host,
                        port = self.config.port,
                        attempt = self.stats.consecutive_connect_failures,
                        backoff = ?self.config.reconnect_backoff,
                        error = %err,
                        "Connect failed, retrying"
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => return None,
                        _ = tokio::time::sleep(self.config.reconnect_backoff) => {}
                    }
                }
            }
        }
    }

    /// Read frames from one connection until something interrupts it.
    async fn stream(&mut self, connection: &mut dyn Connection) -> Interrupt {
        let shape = &self.config.header_shape;
        let order = self.config.byte_order;
        let read_timeout = self.config.read_timeout;
        let mut previous_timestamp: Option<i64> = None;

        loop {
            if self.cancel.is_cancelled() {
                return Interrupt::Cancelled;
            }

            if let Err(interrupt) = read_exact(
                connection,
                &mut self.buffer,
                shape.size(),
                read_timeout,
                &self.cancel,
            )
            .await
            {
                return interrupt;
            }

            let header = match decode_header(&self.buffer, shape, order) {
                Ok(header) => header,
                Err(err) => return Interrupt::Failed(err.into()),
            };

            let declared = payload_size(&header, shape) as usize;
            if declared > self.config.max_payload_bytes {
                return Interrupt::Failed(StreamError::PayloadTooLarge {
                    declared,
                    limit: self.config.max_payload_bytes,
                });
            }

            if let Err(interrupt) =
                read_exact(connection, &mut self.buffer, declared, read_timeout, &self.cancel).await
            {
                return interrupt;
            }

            if previous_timestamp == Some(header.timestamp) {
                self.stats.duplicates_discarded += 1;
                self.publish();
                debug!(
                    timestamp = header.timestamp,
                    discarded = declared,
                    "Discarded frame with repeated timestamp"
                );
                continue;
            }

            let pixels = match decode_payload(&self.buffer, &header, order) {
                Ok(pixels) => pixels,
                Err(err) => return Interrupt::Failed(err.into()),
            };
            let timestamp = header.timestamp;
            let frame = SensorFrame::new(header, pixels);

            trace!(timestamp, bytes = declared, "Yielding frame");
            let delivered = tokio::select! {
                _ = self.cancel.cancelled() => return Interrupt::Cancelled,
                delivered = self.sink.on_frame(frame) => delivered,
            };
            if delivered.is_err() {
                return Interrupt::SinkClosed;
            }

            previous_timestamp = Some(timestamp);
            self.stats.frames_yielded += 1;
            self.publish();
        }
    }

    /// Tear down a failed connection. The next connect attempt is immediate.
    async fn drain(&mut self, mut connection: Box<dyn Connection>, err: StreamError) {
        self.stats.reconnects += 1;
        self.stats.last_error = Some(err.to_string());
        self.set_state(ConnectionState::Draining);
        warn!(
            host = %self.config.host,
            port = self.config.port,
            error = %err,
            "Stream interrupted, reconnecting"
        );

        connection.close().await;
        self.buffer.clear();
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.stats.state != state {
            debug!(from = %self.stats.state, to = %state, "Receiver state change");
        }
        self.stats.state = state;
        self.publish();
    }

    fn publish(&self) {
        self.stats_tx.send_replace(self.stats.clone());
    }
}

/// Fill `buf` with exactly `len` bytes, accumulating short reads.
///
/// Every read is bounded by `read_timeout` and raced against `cancel`.
async fn read_exact(
    connection: &mut dyn Connection,
    buf: &mut Vec<u8>,
    len: usize,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), Interrupt> {
    buf.clear();
    buf.resize(len, 0);

    let mut filled = 0;
    while filled < len {
        let read = tokio::select! {
            _ = cancel.cancelled() => return Err(Interrupt::Cancelled),
            read = tokio::time::timeout(read_timeout, connection.read(&mut buf[filled..])) => read,
        };

        match read {
            Ok(Ok(0)) => {
                return Err(StreamError::TransportClosed { received: filled, expected: len }.into());
            }
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(StreamError::from(e).into()),
            Err(_) => return Err(StreamError::ReadTimeout { timeout: read_timeout }.into()),
        }
    }

    Ok(())
}
