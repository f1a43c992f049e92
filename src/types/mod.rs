//! Core types for sensor frame representation.
//!
//! ## Architecture
//!
//! - [`FrameHeader`] is the fixed-size record that precedes every payload
//! - [`SensorFrame`] is the decoded unit handed to a sink
//! - [`PixelBuffer`] holds decoded samples, typed by [`PixelFormat`]
//! - [`Matrix4x4`] holds row-major transforms, named by [`MatrixSlot`]
//! - [`ByteOrder`] selects the wire endianness of a server build
//! - [`ConnectionState`] and [`ReceiverStats`] describe a running receiver
//!
//! ## Usage Example
//!
//! ```rust
//! use holostream::types::{FrameHeader, PixelBuffer, SensorFrame};
//!
//! let header = FrameHeader {
//!     timestamp: 1_000,
//!     image_width: 2,
//!     image_height: 1,
//!     pixel_stride: 2,
//!     payload_length: Some(4),
//!     ..Default::default()
//! };
//! let pixels = PixelBuffer::Depth16 { width: 2, height: 1, samples: vec![850, 900] };
//! let frame = SensorFrame::new(header, pixels);
//!
//! assert_eq!(frame.pixels.depth_at(1, 0), Some(900));
//! assert_eq!(frame.header.payload_size(), 4);
//! ```

mod byte_order;
mod frame;
mod matrix;
mod pixels;
mod state;

pub use byte_order::ByteOrder;
pub use frame::{CameraIntrinsics, FrameHeader, SensorFrame};
pub use matrix::{Matrix4x4, MatrixSlot, NamedMatrix};
pub use pixels::{BITMAP_FORMAT_BGRA8, BITMAP_FORMAT_GRAY16, PixelBuffer, PixelFormat};
pub use state::{ConnectionState, ReceiverStats};
