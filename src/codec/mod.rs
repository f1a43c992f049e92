//! Frame codec: wire bytes to [`SensorFrame`] and back.
//!
//! Everything here is pure: no I/O, no state, no blocking. The receiver reads
//! `shape.size()` header bytes, calls [`decode_header`], reads
//! [`payload_size`] payload bytes and calls [`decode_payload`].
//!
//! ## Wire Layout
//!
//! ```text
//! ┌───────────────────────────┬────────────────────────────┐
//! │ Header (HeaderShape size) │ Payload (payload_size)     │
//! │ fixed fields, no padding  │ raw pixels per format      │
//! └───────────────────────────┴────────────────────────────┘
//! ```
//!
//! Frames repeat back to back with no delimiter or checksum, so a single
//! misread leaves the rest of the connection misaligned.
//!
//! ## Example
//!
//! ```rust
//! use holostream::codec::{decode_frame, encode_header};
//! use holostream::{ByteOrder, FrameHeader, HeaderShape};
//!
//! let shape = HeaderShape::minimal();
//! let header = FrameHeader {
//!     timestamp: 1000,
//!     image_width: 4,
//!     image_height: 2,
//!     pixel_stride: 4,
//!     payload_length: Some(32),
//!     ..Default::default()
//! };
//! let header_bytes = encode_header(&header, &shape, ByteOrder::Little);
//! let payload = vec![0u8; 32];
//!
//! let frame = decode_frame(&header_bytes, &payload, &shape, ByteOrder::Little).unwrap();
//! assert_eq!(frame.pixels.shape(), (2, 4, 4));
//! ```

mod header;
mod matrix;
mod payload;
mod shape;

pub use header::{decode_header, encode_header};
pub use matrix::{MATRIX_WIRE_SIZE, decode_matrix, encode_matrix};
pub use payload::{decode_payload, payload_size, pixel_format};
pub use shape::{HeaderField, HeaderShape, ShapePreset};

use crate::DecodeError;
use crate::types::{ByteOrder, SensorFrame};

/// Decode one complete frame from its header and payload bytes.
pub fn decode_frame(
    header_bytes: &[u8],
    payload_bytes: &[u8],
    shape: &HeaderShape,
    order: ByteOrder,
) -> Result<SensorFrame, DecodeError> {
    let header = decode_header(header_bytes, shape, order)?;
    let pixels = decode_payload(payload_bytes, &header, order)?;
    Ok(SensorFrame::new(header, pixels))
}
