//! Error types for frame decoding and stream handling.
//!
//! Two layers of errors exist in this crate:
//!
//! - [`DecodeError`] is produced by the pure codec functions when header or
//!   payload bytes do not match what the configured [`HeaderShape`] promises.
//! - [`StreamError`] covers everything the receiver can run into: connection
//!   failures, transport read failures, timeouts, decode failures and
//!   configuration problems.
//!
//! ## Recovery and Retry
//!
//! The receiver never propagates transport or decode errors to the caller; it
//! uses them to drive its state machine and reports them through
//! [`ReceiverStats`](crate::ReceiverStats). Errors still know whether a retry
//! makes sense, which is what the state machine asks:
//!
//! ```rust
//! use holostream::StreamError;
//!
//! let refused = std::io::ErrorKind::ConnectionRefused.into();
//! let error = StreamError::connect_failed("192.168.50.202", 10080, refused);
//! assert!(error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```
//!
//! [`HeaderShape`]: crate::HeaderShape

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for stream operations.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Failure to interpret wire bytes as a frame.
///
/// Every variant means the current connection can no longer be trusted to be
/// byte aligned: either the configured header shape or byte order is wrong for
/// this port, or the stream is corrupt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("Payload size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Unsupported pixel format (pixel stride {pixel_stride}, format code {pixel_format:?})")]
    UnsupportedFormat { pixel_stride: u32, pixel_format: Option<u32> },
}

/// Main error type for stream operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    #[error("Failed to connect to {host}:{port}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Connecting to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout { host: String, port: u16, timeout: Duration },

    #[error("Transport read failed")]
    TransportRead {
        #[source]
        source: std::io::Error,
    },

    #[error("Peer closed the connection after {received} of {expected} bytes")]
    TransportClosed { received: usize, expected: usize },

    #[error("No data received within {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Frame decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Header declares a {declared} byte payload, limit is {limit}")]
    PayloadTooLarge { declared: usize, limit: usize },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Receiver task failed: {reason}")]
    Task { reason: String },
}

impl StreamError {
    /// Returns whether reconnecting can clear this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Connect { .. } => true,
            StreamError::ConnectTimeout { .. } => true,
            StreamError::TransportRead { .. } => true,
            StreamError::TransportClosed { .. } => true,
            StreamError::ReadTimeout { .. } => true,
            // A fresh connection starts on a header boundary again.
            StreamError::Decode(_) => true,
            StreamError::PayloadTooLarge { .. } => true,
            StreamError::Config { .. } => false,
            StreamError::File { .. } => false,
            StreamError::Task { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StreamError::Connect { .. } | StreamError::ConnectTimeout { .. } => vec![
                "Ensure the streaming app is running on the headset",
                "Check the headset IP address and that both ends share a network",
                "Verify the port matches the sensor type (10080 color, 10081 depth)",
            ],
            StreamError::TransportRead { .. } | StreamError::TransportClosed { .. } => vec![
                "Check Wi-Fi signal strength between headset and host",
                "Verify the streaming app has not been suspended",
            ],
            StreamError::ReadTimeout { .. } => vec![
                "Increase the read timeout",
                "Check that the sensor is producing frames",
            ],
            StreamError::Decode(_) | StreamError::PayloadTooLarge { .. } => vec![
                "Verify the header shape matches the server build for this port",
                "Verify the configured byte order matches the server build",
            ],
            StreamError::Config { .. } => vec![
                "Check the configuration values",
                "Use one of the header shape presets",
            ],
            StreamError::File { .. } => {
                vec![
                    "Check the configuration file exists and is readable",
                    "Check file permissions",
                ]
            }
            StreamError::Task { .. } => vec!["Check the logs for a panic in the frame sink"],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connect_failed(host: impl Into<String>, port: u16, source: std::io::Error) -> Self {
        StreamError::Connect { host: host.into(), port, source }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        StreamError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        StreamError::File { path, source }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::TransportRead { source: err }
    }
}
