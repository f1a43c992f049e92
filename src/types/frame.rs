//! Frame header and decoded frame types

use serde::{Deserialize, Serialize};

use super::{Matrix4x4, MatrixSlot, NamedMatrix, PixelBuffer};

/// Pinhole camera intrinsics sent by the richer header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub focal_length_x: f32,
    pub focal_length_y: f32,
    pub principal_point_x: f32,
    pub principal_point_y: f32,
}

/// Fixed-size record sent before every payload.
///
/// Which optional fields are populated depends on the
/// [`HeaderShape`](crate::HeaderShape) the header was decoded with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Device clock in nanoseconds. Monotonic per stream, not unique.
    pub timestamp: i64,
    pub image_width: u32,
    pub image_height: u32,
    /// Bytes per pixel, or bytes per row when `pixel_format` is set.
    pub pixel_stride: u32,
    pub payload_length: Option<u32>,
    /// `BitmapPixelFormat` code from the HoloROS publisher.
    pub pixel_format: Option<u32>,
    pub intrinsics: Option<CameraIntrinsics>,
    /// Row-major transforms in header order.
    pub matrices: Vec<NamedMatrix>,
}

impl FrameHeader {
    /// Byte count of the payload that follows this header.
    ///
    /// Uses the explicit length when present, else `image_height * pixel_stride`.
    pub fn payload_size(&self) -> u32 {
        self.payload_length
            .unwrap_or_else(|| self.image_height.saturating_mul(self.pixel_stride))
    }

    pub fn matrix(&self, slot: MatrixSlot) -> Option<&Matrix4x4> {
        self.matrices.iter().find(|m| m.slot == slot).map(|m| &m.matrix)
    }
}

/// One decoded frame: header, pixels, and header transforms.
///
/// Built only once both header and the complete payload were received, and
/// handed to the sink by value.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    pub header: FrameHeader,
    pub pixels: PixelBuffer,
}

impl SensorFrame {
    pub fn new(header: FrameHeader, pixels: PixelBuffer) -> Self {
        Self { header, pixels }
    }

    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    /// Named transforms decoded from the header, row-major.
    pub fn matrices(&self) -> &[NamedMatrix] {
        &self.header.matrices
    }

    pub fn matrix(&self, slot: MatrixSlot) -> Option<&Matrix4x4> {
        self.header.matrix(slot)
    }

    pub fn intrinsics(&self) -> Option<&CameraIntrinsics> {
        self.header.intrinsics.as_ref()
    }
}
