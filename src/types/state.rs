//! Receiver state and diagnostics snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-stream receiver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not started yet, or stopped by cancellation.
    #[default]
    Disconnected,
    Connecting,
    Streaming,
    /// Tearing down a failed connection before reconnecting.
    Draining,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Draining => "draining",
        };
        f.write_str(name)
    }
}

/// Diagnostics published by a receiver on every state change and frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReceiverStats {
    pub state: ConnectionState,
    /// Failed connect attempts since start.
    pub connect_failures: u64,
    /// Failed connect attempts since the last successful connect.
    pub consecutive_connect_failures: u64,
    /// Connections torn down after a transport or decode failure.
    pub reconnects: u64,
    pub frames_yielded: u64,
    /// Frames skipped because they repeated the previous timestamp.
    pub duplicates_discarded: u64,
    pub last_error: Option<String>,
}

impl ReceiverStats {
    pub fn is_streaming(&self) -> bool {
        self.state == ConnectionState::Streaming
    }
}
