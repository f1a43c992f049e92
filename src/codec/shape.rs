//! Header shape descriptions
//!
//! The wire header is not self-describing: each server build writes a fixed
//! sequence of fields, and the receiver has to be told which sequence to
//! expect on a given port. A [`HeaderShape`] is that sequence.
//!
//! # Known layouts
//!
//! | Preset | Fields | Size |
//! |---|---|---|
//! | [`minimal`](HeaderShape::minimal) | `i64 ts, u32 w, u32 h, u32 stride, u32 len` | 24 |
//! | [`with_intrinsics`](HeaderShape::with_intrinsics) | minimal + `f32 fx, fy, cx, cy` | 40 |
//! | [`with_pose`](HeaderShape::with_pose) | minimal + `f32[16]` camera pose | 88 |
//! | [`with_intrinsics_and_pose`][wip] | minimal + intrinsics + pose | 104 |
//! | [`holoros`](HeaderShape::holoros) | `i64 ts, u32 w, h, step, format` + 3 `f32[16]` | 216 |
//!
//! [wip]: HeaderShape::with_intrinsics_and_pose

use serde::{Deserialize, Serialize};

use crate::types::MatrixSlot;
use crate::{Result, StreamError};

/// One typed field of a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "FieldName", into = "FieldName")]
pub enum HeaderField {
    /// `i64` device timestamp in nanoseconds.
    Timestamp,
    ImageWidth,
    ImageHeight,
    PixelStride,
    /// `u32` explicit payload byte count.
    PayloadLength,
    /// `u32` `BitmapPixelFormat` code; payload is then `height * stride` bytes.
    PixelFormat,
    /// Four `f32`: focal length x/y, principal point x/y.
    Intrinsics,
    /// Sixteen `f32`, column-major.
    Matrix(MatrixSlot),
}

/// Flat spelling of [`HeaderField`] used in config files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FieldName {
    Timestamp,
    ImageWidth,
    ImageHeight,
    PixelStride,
    PayloadLength,
    PixelFormat,
    Intrinsics,
    CameraPose,
    FrameToOrigin,
    CameraView,
    CameraProjection,
}

impl From<FieldName> for HeaderField {
    fn from(name: FieldName) -> Self {
        match name {
            FieldName::Timestamp => HeaderField::Timestamp,
            FieldName::ImageWidth => HeaderField::ImageWidth,
            FieldName::ImageHeight => HeaderField::ImageHeight,
            FieldName::PixelStride => HeaderField::PixelStride,
            FieldName::PayloadLength => HeaderField::PayloadLength,
            FieldName::PixelFormat => HeaderField::PixelFormat,
            FieldName::Intrinsics => HeaderField::Intrinsics,
            FieldName::CameraPose => HeaderField::Matrix(MatrixSlot::CameraPose),
            FieldName::FrameToOrigin => HeaderField::Matrix(MatrixSlot::FrameToOrigin),
            FieldName::CameraView => HeaderField::Matrix(MatrixSlot::CameraView),
            FieldName::CameraProjection => HeaderField::Matrix(MatrixSlot::CameraProjection),
        }
    }
}

impl From<HeaderField> for FieldName {
    fn from(field: HeaderField) -> Self {
        match field {
            HeaderField::Timestamp => FieldName::Timestamp,
            HeaderField::ImageWidth => FieldName::ImageWidth,
            HeaderField::ImageHeight => FieldName::ImageHeight,
            HeaderField::PixelStride => FieldName::PixelStride,
            HeaderField::PayloadLength => FieldName::PayloadLength,
            HeaderField::PixelFormat => FieldName::PixelFormat,
            HeaderField::Intrinsics => FieldName::Intrinsics,
            HeaderField::Matrix(MatrixSlot::CameraPose) => FieldName::CameraPose,
            HeaderField::Matrix(MatrixSlot::FrameToOrigin) => FieldName::FrameToOrigin,
            HeaderField::Matrix(MatrixSlot::CameraView) => FieldName::CameraView,
            HeaderField::Matrix(MatrixSlot::CameraProjection) => FieldName::CameraProjection,
        }
    }
}

impl HeaderField {
    /// Encoded size in bytes.
    pub const fn size(self) -> usize {
        match self {
            HeaderField::Timestamp => 8,
            HeaderField::ImageWidth
            | HeaderField::ImageHeight
            | HeaderField::PixelStride
            | HeaderField::PayloadLength
            | HeaderField::PixelFormat => 4,
            HeaderField::Intrinsics => 16,
            HeaderField::Matrix(_) => 64,
        }
    }
}

/// Named layouts observed across server builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapePreset {
    Minimal,
    WithIntrinsics,
    WithPose,
    WithIntrinsicsAndPose,
    Holoros,
}

/// Ordered list of header fields with a fixed total size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShapeRepr", into = "ShapeRepr")]
pub struct HeaderShape {
    fields: Vec<HeaderField>,
    size: usize,
}

/// Config files may name a preset or spell out the fields.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ShapeRepr {
    Preset(ShapePreset),
    Fields(Vec<HeaderField>),
}

const BASE_FIELDS: [HeaderField; 4] = [
    HeaderField::Timestamp,
    HeaderField::ImageWidth,
    HeaderField::ImageHeight,
    HeaderField::PixelStride,
];

impl HeaderShape {
    /// Build a shape from an explicit field list, validating it.
    ///
    /// The four base fields must each appear exactly once. Exactly one of
    /// `PayloadLength` / `PixelFormat` must appear, since the payload size
    /// comes from one of them. At most one `Intrinsics` may appear, and
    /// each matrix slot may appear once.
    pub fn new(fields: Vec<HeaderField>) -> Result<Self> {
        for required in BASE_FIELDS {
            let count = fields.iter().filter(|f| **f == required).count();
            if count != 1 {
                return Err(StreamError::invalid_config(format!(
                    "header shape must contain {:?} exactly once, found {}",
                    required, count
                )));
            }
        }

        let length_fields = fields
            .iter()
            .filter(|f| matches!(f, HeaderField::PayloadLength | HeaderField::PixelFormat))
            .count();
        if length_fields != 1 {
            return Err(StreamError::invalid_config(
                "header shape must carry exactly one of PayloadLength or PixelFormat",
            ));
        }

        if fields.iter().filter(|f| **f == HeaderField::Intrinsics).count() > 1 {
            return Err(StreamError::invalid_config("header shape repeats Intrinsics"));
        }

        let mut slots = Vec::new();
        for field in &fields {
            if let HeaderField::Matrix(slot) = field {
                if slots.contains(slot) {
                    return Err(StreamError::invalid_config(format!(
                        "header shape repeats matrix slot {:?}",
                        slot
                    )));
                }
                slots.push(*slot);
            }
        }

        Ok(Self::from_fields(fields))
    }

    fn from_fields(fields: Vec<HeaderField>) -> Self {
        let size = fields.iter().map(|f| f.size()).sum();
        Self { fields, size }
    }

    /// Shape for a named server layout. See the table in the module docs.
    pub fn preset(preset: ShapePreset) -> Self {
        match preset {
            ShapePreset::Minimal => Self::minimal(),
            ShapePreset::WithIntrinsics => Self::with_intrinsics(),
            ShapePreset::WithPose => Self::with_pose(),
            ShapePreset::WithIntrinsicsAndPose => Self::with_intrinsics_and_pose(),
            ShapePreset::Holoros => Self::holoros(),
        }
    }

    /// `timestamp, width, height, pixel stride, payload length`.
    pub fn minimal() -> Self {
        let mut fields = BASE_FIELDS.to_vec();
        fields.push(HeaderField::PayloadLength);
        Self::from_fields(fields)
    }

    /// Minimal header followed by `fx, fy, cx, cy`.
    pub fn with_intrinsics() -> Self {
        let mut fields = Self::minimal().fields;
        fields.push(HeaderField::Intrinsics);
        Self::from_fields(fields)
    }

    /// Minimal header followed by the 4x4 camera pose.
    pub fn with_pose() -> Self {
        let mut fields = Self::minimal().fields;
        fields.push(HeaderField::Matrix(MatrixSlot::CameraPose));
        Self::from_fields(fields)
    }

    /// Minimal header, intrinsics, then the camera pose.
    pub fn with_intrinsics_and_pose() -> Self {
        let mut fields = Self::with_intrinsics().fields;
        fields.push(HeaderField::Matrix(MatrixSlot::CameraPose));
        Self::from_fields(fields)
    }

    /// HoloROS publisher: row step plus pixel format code, then the
    /// frame-to-origin, view and projection transforms.
    pub fn holoros() -> Self {
        let mut fields = BASE_FIELDS.to_vec();
        fields.extend([
            HeaderField::PixelFormat,
            HeaderField::Matrix(MatrixSlot::FrameToOrigin),
            HeaderField::Matrix(MatrixSlot::CameraView),
            HeaderField::Matrix(MatrixSlot::CameraProjection),
        ]);
        Self::from_fields(fields)
    }

    /// Encoded header size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Whether the payload size is read from an explicit length field.
    pub fn carries_payload_length(&self) -> bool {
        self.fields.contains(&HeaderField::PayloadLength)
    }

    /// Whether the header carries a bitmap format code. The payload size is
    /// then `height * pixel_stride`.
    pub fn carries_pixel_format(&self) -> bool {
        self.fields.contains(&HeaderField::PixelFormat)
    }

    /// Matrix slots in wire order.
    pub fn matrix_slots(&self) -> impl Iterator<Item = MatrixSlot> + '_ {
        self.fields.iter().filter_map(|f| match f {
            HeaderField::Matrix(slot) => Some(*slot),
            _ => None,
        })
    }
}

impl Default for HeaderShape {
    fn default() -> Self {
        Self::minimal()
    }
}

impl From<ShapePreset> for HeaderShape {
    fn from(preset: ShapePreset) -> Self {
        Self::preset(preset)
    }
}

impl TryFrom<ShapeRepr> for HeaderShape {
    type Error = StreamError;

    fn try_from(repr: ShapeRepr) -> Result<Self> {
        match repr {
            ShapeRepr::Preset(preset) => Ok(Self::preset(preset)),
            ShapeRepr::Fields(fields) => Self::new(fields),
        }
    }
}

impl From<HeaderShape> for ShapeRepr {
    fn from(shape: HeaderShape) -> Self {
        ShapeRepr::Fields(shape.fields)
    }
}
