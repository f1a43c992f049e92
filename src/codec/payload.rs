//! Payload decoding into typed pixel buffers

use super::shape::HeaderShape;
use crate::DecodeError;
use crate::types::{ByteOrder, FrameHeader, PixelBuffer, PixelFormat};

/// Exact byte count of the payload following `header`.
///
/// Returns the explicit `payload_length` when `shape` carries one, otherwise
/// `image_height * pixel_stride` (saturating).
pub fn payload_size(header: &FrameHeader, shape: &HeaderShape) -> u32 {
    match (shape.carries_payload_length(), header.payload_length) {
        (true, Some(length)) => length,
        _ => header.image_height.saturating_mul(header.pixel_stride),
    }
}

/// Resolve the pixel format a header describes.
///
/// A `BitmapPixelFormat` code wins when the header has one; otherwise the
/// pixel stride is bytes-per-pixel and selects from the stride table.
pub fn pixel_format(header: &FrameHeader) -> Result<PixelFormat, DecodeError> {
    let format = match header.pixel_format {
        Some(code) => PixelFormat::from_bitmap_code(code),
        None => PixelFormat::from_pixel_stride(header.pixel_stride),
    };
    format.ok_or(DecodeError::UnsupportedFormat {
        pixel_stride: header.pixel_stride,
        pixel_format: header.pixel_format,
    })
}

/// Decode a complete payload into pixels.
///
/// Depth samples are read with `order`. When the header carries a pixel
/// format code its stride is a row step and per-row padding is dropped.
///
/// # Errors
///
/// - [`DecodeError::SizeMismatch`] if `bytes` is not exactly the declared
///   payload size, or the payload cannot hold `width * height` pixels
/// - [`DecodeError::UnsupportedFormat`] for strides or codes outside the
///   format table
pub fn decode_payload(
    bytes: &[u8],
    header: &FrameHeader,
    order: ByteOrder,
) -> Result<PixelBuffer, DecodeError> {
    let expected = header.payload_size() as usize;
    if bytes.len() != expected {
        return Err(DecodeError::SizeMismatch { expected, actual: bytes.len() });
    }
    if bytes.is_empty() {
        return Ok(PixelBuffer::Empty);
    }

    let format = pixel_format(header)?;
    let width = header.image_width as usize;
    let height = header.image_height as usize;
    let packed_row = width.saturating_mul(format.bytes_per_pixel() as usize);
    let row_step = match header.pixel_format {
        Some(_) => header.pixel_stride as usize,
        None => packed_row,
    };

    if row_step < packed_row || row_step.checked_mul(height) != Some(bytes.len()) {
        return Err(DecodeError::SizeMismatch {
            expected: packed_row.saturating_mul(height),
            actual: bytes.len(),
        });
    }

    let rows = bytes.chunks_exact(row_step.max(1)).take(height).map(|row| &row[..packed_row]);

    let pixels = match format {
        PixelFormat::Depth16 => {
            let mut samples = Vec::with_capacity(width * height);
            for row in rows {
                samples.extend(row.chunks_exact(2).map(|b| order.read_u16([b[0], b[1]])));
            }
            PixelBuffer::Depth16 { width: header.image_width, height: header.image_height, samples }
        }
        PixelFormat::Bgr8 | PixelFormat::Bgra8 => {
            let mut samples = Vec::with_capacity(packed_row * height);
            for row in rows {
                samples.extend_from_slice(row);
            }
            PixelBuffer::Color8 {
                width: header.image_width,
                height: header.image_height,
                channels: format.channels(),
                samples,
            }
        }
    };

    Ok(pixels)
}
