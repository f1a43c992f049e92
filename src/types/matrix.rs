//! 4×4 transform matrices carried in frame headers

use serde::{Deserialize, Serialize};

/// Row-major 4×4 matrix of `f32`.
///
/// The wire carries matrices column-major; the codec transposes on read so
/// every value of this type is row-major: `rows[r][c]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix4x4 {
    pub rows: [[f32; 4]; 4],
}

impl Matrix4x4 {
    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    pub const fn identity() -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn transpose(&self) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.rows[c][r];
            }
        }
        Self { rows }
    }

    /// Translation component of a rigid transform (last column).
    pub fn translation(&self) -> [f32; 3] {
        [self.rows[0][3], self.rows[1][3], self.rows[2][3]]
    }
}

/// Names the coordinate-frame relationship a header matrix describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixSlot {
    /// Camera pose sent by the viewer build with intrinsics.
    CameraPose,
    /// Frame-to-world transform.
    FrameToOrigin,
    /// Camera view transform.
    CameraView,
    /// Camera projection transform.
    CameraProjection,
}

/// A decoded matrix together with the slot it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamedMatrix {
    pub slot: MatrixSlot,
    pub matrix: Matrix4x4,
}
