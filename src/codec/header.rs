//! Frame header decoding and encoding
//!
//! Fields are read strictly in [`HeaderShape`] order with the configured
//! [`ByteOrder`]; there is no padding between fields on the wire.

use tracing::trace;

use super::matrix::{MATRIX_WIRE_SIZE, decode_matrix, encode_matrix};
use super::shape::{HeaderField, HeaderShape};
use crate::DecodeError;
use crate::types::{ByteOrder, CameraIntrinsics, FrameHeader, Matrix4x4, NamedMatrix};

/// Sequential reader over a slice whose length was already checked.
struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self { bytes, pos: 0, order }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> u32 {
        let bytes = self.take::<4>();
        self.order.read_u32(bytes)
    }

    fn i64(&mut self) -> i64 {
        let bytes = self.take::<8>();
        self.order.read_i64(bytes)
    }

    fn f32(&mut self) -> f32 {
        let bytes = self.take::<4>();
        self.order.read_f32(bytes)
    }

    fn matrix(&mut self) -> Matrix4x4 {
        let bytes = self.take::<MATRIX_WIRE_SIZE>();
        decode_matrix(&bytes, self.order)
    }
}

/// Decode a frame header laid out as `shape`.
///
/// Only the first `shape.size()` bytes are read; a longer slice is fine.
///
/// # Errors
///
/// [`DecodeError::TruncatedHeader`] if `bytes` is shorter than the shape.
pub fn decode_header(
    bytes: &[u8],
    shape: &HeaderShape,
    order: ByteOrder,
) -> Result<FrameHeader, DecodeError> {
    let expected = shape.size();
    if bytes.len() < expected {
        return Err(DecodeError::TruncatedHeader { expected, actual: bytes.len() });
    }

    let mut reader = FieldReader::new(&bytes[..expected], order);
    let mut header = FrameHeader::default();

    for field in shape.fields() {
        match *field {
            HeaderField::Timestamp => header.timestamp = reader.i64(),
            HeaderField::ImageWidth => header.image_width = reader.u32(),
            HeaderField::ImageHeight => header.image_height = reader.u32(),
            HeaderField::PixelStride => header.pixel_stride = reader.u32(),
            HeaderField::PayloadLength => header.payload_length = Some(reader.u32()),
            HeaderField::PixelFormat => header.pixel_format = Some(reader.u32()),
            HeaderField::Intrinsics => {
                header.intrinsics = Some(CameraIntrinsics {
                    focal_length_x: reader.f32(),
                    focal_length_y: reader.f32(),
                    principal_point_x: reader.f32(),
                    principal_point_y: reader.f32(),
                })
            }
            HeaderField::Matrix(slot) => {
                header.matrices.push(NamedMatrix { slot, matrix: reader.matrix() })
            }
        }
    }

    trace!(
        timestamp = header.timestamp,
        width = header.image_width,
        height = header.image_height,
        pixel_stride = header.pixel_stride,
        "Decoded frame header"
    );

    Ok(header)
}

/// Encode `header` laid out as `shape`.
///
/// Fields the header does not populate are written as zeros, except
/// `PayloadLength`, which falls back to [`FrameHeader::payload_size`].
pub fn encode_header(header: &FrameHeader, shape: &HeaderShape, order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(shape.size());

    for field in shape.fields() {
        match *field {
            HeaderField::Timestamp => out.extend_from_slice(&order.write_i64(header.timestamp)),
            HeaderField::ImageWidth => out.extend_from_slice(&order.write_u32(header.image_width)),
            HeaderField::ImageHeight => {
                out.extend_from_slice(&order.write_u32(header.image_height))
            }
            HeaderField::PixelStride => {
                out.extend_from_slice(&order.write_u32(header.pixel_stride))
            }
            HeaderField::PayloadLength => {
                out.extend_from_slice(&order.write_u32(header.payload_size()))
            }
            HeaderField::PixelFormat => {
                out.extend_from_slice(&order.write_u32(header.pixel_format.unwrap_or(0)))
            }
            HeaderField::Intrinsics => {
                let k = header.intrinsics.unwrap_or_default();
                for value in
                    [k.focal_length_x, k.focal_length_y, k.principal_point_x, k.principal_point_y]
                {
                    out.extend_from_slice(&order.write_f32(value));
                }
            }
            HeaderField::Matrix(slot) => {
                let matrix = header.matrix(slot).copied().unwrap_or_default();
                out.extend_from_slice(&encode_matrix(&matrix, order));
            }
        }
    }

    out
}
