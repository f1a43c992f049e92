//! Receiver configuration.
//!
//! The wire format is negotiated out of band: which [`HeaderShape`] and
//! [`ByteOrder`] a port uses depends on the server build, so both are explicit
//! configuration values. Durations are stored in milliseconds in config files.
//!
//! ```yaml
//! host: 192.168.50.202
//! port: 10081
//! header_shape: holoros
//! byte_order: little
//! connect_timeout_ms: 3000
//! read_timeout_ms: 3000
//! reconnect_backoff_ms: 3000
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::codec::HeaderShape;
use crate::types::ByteOrder;
use crate::{Result, StreamError};

/// Color (photo/video camera) stream port.
pub const COLOR_PORT: u16 = 10080;
/// Depth (short-throw sensor) stream port.
pub const DEPTH_PORT: u16 = 10081;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(3);
/// Upper bound on a single declared payload.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Sensor stream types, each served on its own port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Photo/video camera.
    Color,
    /// Short-throw depth camera.
    Depth,
}

impl SensorKind {
    /// Port the stream server listens on for this sensor.
    pub fn port(self) -> u16 {
        match self {
            SensorKind::Color => COLOR_PORT,
            SensorKind::Depth => DEPTH_PORT,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Color => f.write_str("color"),
            SensorKind::Depth => f.write_str("depth"),
        }
    }
}

impl FromStr for SensorKind {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "color" | "photovideo" | "pv" => Ok(SensorKind::Color),
            "depth" | "shortthrowdepth" => Ok(SensorKind::Depth),
            other => Err(StreamError::invalid_config(format!("unknown sensor type '{}'", other))),
        }
    }
}

/// Everything one receiver needs to reach and parse one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Headset address or hostname.
    pub host: String,
    pub port: u16,
    /// Header layout of the server build on this port.
    #[serde(default)]
    pub header_shape: HeaderShape,
    #[serde(default)]
    pub byte_order: ByteOrder,
    #[serde(rename = "connect_timeout_ms", with = "millis", default = "default_timeout")]
    pub connect_timeout: Duration,
    #[serde(rename = "read_timeout_ms", with = "millis", default = "default_timeout")]
    pub read_timeout: Duration,
    #[serde(rename = "reconnect_backoff_ms", with = "millis", default = "default_backoff")]
    pub reconnect_backoff: Duration,
    /// Declared payloads above this are treated as misalignment.
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: usize,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_backoff() -> Duration {
    DEFAULT_RECONNECT_BACKOFF
}

fn default_max_payload() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl StreamConfig {
    /// Config with default timeouts and little-endian byte order.
    pub fn new(host: impl Into<String>, port: u16, header_shape: HeaderShape) -> Self {
        Self {
            host: host.into(),
            port,
            header_shape,
            byte_order: ByteOrder::Little,
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    /// Defaults for the HoloROS publisher: its port for `kind`, the
    /// `holoros` header shape, little-endian.
    pub fn for_sensor(host: impl Into<String>, kind: SensorKind) -> Self {
        Self::new(host, kind.port(), HeaderShape::holoros())
    }

    /// Set the wire byte order. Must match the server build on this port.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Bound on a single connect attempt. A timeout counts as a failed attempt.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on every read. Expiry drains the connection and reconnects.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Delay between failed connect attempts. Must be non-zero.
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Largest payload a header may declare before the stream is treated
    /// as misaligned.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Parse and validate a YAML config document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| StreamError::invalid_config(format!("YAML parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| StreamError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), bytes = yaml.len(), "Loaded stream config");
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to the YAML form [`from_yaml_str`](Self::from_yaml_str) reads.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| StreamError::invalid_config(format!("YAML serialize failed: {}", e)))
    }

    /// Reject values the receiver cannot run with: an empty host, port 0, or
    /// a zero timeout, backoff or payload limit.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(StreamError::invalid_config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(StreamError::invalid_config("port must not be 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(StreamError::invalid_config("connect timeout must be positive"));
        }
        if self.read_timeout.is_zero() {
            return Err(StreamError::invalid_config("read timeout must be positive"));
        }
        if self.reconnect_backoff.is_zero() {
            return Err(StreamError::invalid_config("reconnect backoff must be positive"));
        }
        if self.max_payload_bytes == 0 {
            return Err(StreamError::invalid_config("max payload bytes must be positive"));
        }
        Ok(())
    }

    /// `host:port`, for logs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
