//! Decoded pixel storage and pixel format selection

use serde::{Deserialize, Serialize};

/// `BitmapPixelFormat::Gray16` as written by the HoloROS publisher.
pub const BITMAP_FORMAT_GRAY16: u32 = 57;
/// `BitmapPixelFormat::Bgra8` as written by the HoloROS publisher.
pub const BITMAP_FORMAT_BGRA8: u32 = 87;

/// Pixel layout of a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Single channel u16, depth in millimeters.
    Depth16,
    /// Three channel u8, packed color.
    Bgr8,
    /// Four channel u8, packed color with alpha.
    Bgra8,
}

impl PixelFormat {
    /// Select the format from the header's pixel stride (bytes per pixel).
    pub fn from_pixel_stride(stride: u32) -> Option<Self> {
        match stride {
            2 => Some(PixelFormat::Depth16),
            3 => Some(PixelFormat::Bgr8),
            4 => Some(PixelFormat::Bgra8),
            _ => None,
        }
    }

    /// Select the format from a `BitmapPixelFormat` code.
    pub fn from_bitmap_code(code: u32) -> Option<Self> {
        match code {
            BITMAP_FORMAT_GRAY16 => Some(PixelFormat::Depth16),
            BITMAP_FORMAT_BGRA8 => Some(PixelFormat::Bgra8),
            _ => None,
        }
    }

    /// Samples per pixel.
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Depth16 => 1,
            PixelFormat::Bgr8 => 3,
            PixelFormat::Bgra8 => 4,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Depth16 => 2,
            PixelFormat::Bgr8 => 3,
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// Decoded samples, logically a `height × width × channels` array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PixelBuffer {
    /// A frame whose header declared no payload.
    #[default]
    Empty,
    Depth16 {
        width: u32,
        height: u32,
        samples: Vec<u16>,
    },
    Color8 {
        width: u32,
        height: u32,
        channels: u8,
        samples: Vec<u8>,
    },
}

impl PixelBuffer {
    /// Width in pixels, 0 for an empty buffer.
    pub fn width(&self) -> u32 {
        match self {
            PixelBuffer::Empty => 0,
            PixelBuffer::Depth16 { width, .. } | PixelBuffer::Color8 { width, .. } => *width,
        }
    }

    /// Height in pixels, 0 for an empty buffer.
    pub fn height(&self) -> u32 {
        match self {
            PixelBuffer::Empty => 0,
            PixelBuffer::Depth16 { height, .. } | PixelBuffer::Color8 { height, .. } => *height,
        }
    }

    /// Samples per pixel: 1 for depth, 3 or 4 for color.
    pub fn channels(&self) -> u8 {
        match self {
            PixelBuffer::Empty => 0,
            PixelBuffer::Depth16 { .. } => 1,
            PixelBuffer::Color8 { channels, .. } => *channels,
        }
    }

    /// `(height, width, channels)`, the array shape consumers reshape into.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height() as usize, self.width() as usize, self.channels() as usize)
    }

    /// Number of samples (elements, not bytes).
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::Empty => 0,
            PixelBuffer::Depth16 { samples, .. } => samples.len(),
            PixelBuffer::Color8 { samples, .. } => samples.len(),
        }
    }

    /// True for [`PixelBuffer::Empty`] and zero-area frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major depth samples in millimeters, `None` for color frames.
    pub fn as_depth(&self) -> Option<&[u16]> {
        match self {
            PixelBuffer::Depth16 { samples, .. } => Some(samples),
            _ => None,
        }
    }

    /// Row-major interleaved BGR or BGRA bytes, `None` for depth frames.
    pub fn as_color(&self) -> Option<&[u8]> {
        match self {
            PixelBuffer::Color8 { samples, .. } => Some(samples),
            _ => None,
        }
    }

    /// Depth sample at `(x, y)`, `None` for color frames or out of bounds.
    pub fn depth_at(&self, x: u32, y: u32) -> Option<u16> {
        match self {
            PixelBuffer::Depth16 { width, height, samples } if x < *width && y < *height => {
                samples.get(y as usize * *width as usize + x as usize).copied()
            }
            _ => None,
        }
    }
}
