//! Resilient receiver for headset sensor frame streams.
//!
//! Holostream connects to a mixed-reality headset that streams camera frames
//! over TCP, splits the byte stream into fixed-size headers and payloads, and
//! hands decoded frames to your code. Connection loss, stalls and misaligned
//! data are handled by reconnecting; the caller only ever sees whole frames.
//!
//! # Features
//!
//! - **Configurable wire format**: header layouts and byte order per server build
//! - **Typed pixels**: 16-bit depth maps and 8-bit BGR/BGRA images
//! - **Pose data**: row-major 4x4 transforms and pinhole intrinsics from headers
//! - **Self-healing**: bounded timeouts, reconnect with backoff, duplicate filtering
//! - **Concurrent streams**: one independent task per port
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use holostream::{HoloStream, SensorKind, StreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> holostream::Result<()> {
//!     let config = StreamConfig::for_sensor("192.168.50.202", SensorKind::Depth);
//!     let (handle, mut frames) = HoloStream::subscribe(config)?;
//!
//!     while let Some(frame) = frames.next().await {
//!         let (height, width, _) = frame.pixels.shape();
//!         println!("{}: {}x{} depth frame", frame.timestamp(), width, height);
//!     }
//!
//!     handle.join().await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Receiver runtime
pub mod connection;
mod receiver;
pub mod sink;
pub mod transport;
pub mod transports;

// Core exports
pub use codec::{HeaderField, HeaderShape, ShapePreset};
pub use config::{SensorKind, StreamConfig};
pub use connection::StreamHandle;
pub use error::*;
pub use sink::{ChannelSink, FnSink, FrameSink, FrameStream, SinkClosed};
pub use transport::{Connection, Transport};
pub use transports::TcpTransport;
pub use types::*;

/// Entry point for starting stream receivers.
///
/// Each call spawns one receiver task on the current Tokio runtime and
/// returns its [`StreamHandle`]. Receivers share nothing, so receiving the
/// color and depth streams side by side is two calls.
///
/// # Examples
///
/// ## Callback sink
/// ```rust,no_run
/// use holostream::{FnSink, HoloStream, SensorKind, StreamConfig};
///
/// # #[tokio::main]
/// # async fn main() -> holostream::Result<()> {
/// let config = StreamConfig::for_sensor("192.168.50.202", SensorKind::Color);
/// let handle = HoloStream::start(config, FnSink::new(|frame| {
///     println!("frame {} ({} samples)", frame.timestamp(), frame.pixels.len());
/// }))?;
/// # handle.cancel();
/// # Ok(())
/// # }
/// ```
///
/// ## Both sensors
/// ```rust,no_run
/// use holostream::{HoloStream, SensorKind, StreamConfig};
///
/// # #[tokio::main]
/// # async fn main() -> holostream::Result<()> {
/// let host = "192.168.50.202";
/// let (color, color_frames) =
///     HoloStream::subscribe(StreamConfig::for_sensor(host, SensorKind::Color))?;
/// let (depth, depth_frames) =
///     HoloStream::subscribe(StreamConfig::for_sensor(host, SensorKind::Depth))?;
/// # Ok(())
/// # }
/// ```
pub struct HoloStream;

impl HoloStream {
    /// Start a TCP receiver that delivers frames to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `config` fails [`StreamConfig::validate`]
    /// - no Tokio runtime is running
    ///
    /// Connection problems are not errors here; the receiver retries them and
    /// reports them through [`StreamHandle::stats`].
    pub fn start<S: FrameSink>(config: StreamConfig, sink: S) -> Result<StreamHandle> {
        Self::start_with_transport(config, TcpTransport::new(), sink)
    }

    /// Start a receiver over a custom [`Transport`].
    pub fn start_with_transport<T, S>(
        config: StreamConfig,
        transport: T,
        sink: S,
    ) -> Result<StreamHandle>
    where
        T: Transport,
        S: FrameSink,
    {
        StreamHandle::spawn(config, transport, sink)
    }

    /// Start a TCP receiver and return its frames as a stream.
    ///
    /// The receiver waits for each frame to be taken before reading the
    /// next. Dropping the [`FrameStream`] stops the receiver.
    pub fn subscribe(config: StreamConfig) -> Result<(StreamHandle, FrameStream)> {
        Self::subscribe_with_transport(config, TcpTransport::new())
    }

    /// [`subscribe`](Self::subscribe) over a custom [`Transport`].
    pub fn subscribe_with_transport<T: Transport>(
        config: StreamConfig,
        transport: T,
    ) -> Result<(StreamHandle, FrameStream)> {
        let (sink, frames) = sink::channel();
        let handle = Self::start_with_transport(config, transport, sink)?;
        Ok((handle, frames))
    }
}
