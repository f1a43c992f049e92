//! Matrix wire format
//!
//! A matrix travels as sixteen `f32` in column-major order. Every consumer of
//! [`Matrix4x4`] expects row-major values, so decoding always transposes.

use crate::types::{ByteOrder, Matrix4x4};

/// Bytes occupied by one matrix on the wire.
pub const MATRIX_WIRE_SIZE: usize = 64;

/// Read sixteen column-major `f32` and return the row-major matrix.
pub fn decode_matrix(bytes: &[u8; MATRIX_WIRE_SIZE], order: ByteOrder) -> Matrix4x4 {
    let mut wire = [[0.0f32; 4]; 4];
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        let value = order.read_f32([chunk[0], chunk[1], chunk[2], chunk[3]]);
        wire[i / 4][i % 4] = value;
    }
    Matrix4x4::from_rows(wire).transpose()
}

/// Write `matrix` as sixteen column-major `f32`.
pub fn encode_matrix(matrix: &Matrix4x4, order: ByteOrder) -> [u8; MATRIX_WIRE_SIZE] {
    let wire = matrix.transpose();
    let mut out = [0u8; MATRIX_WIRE_SIZE];
    for (i, chunk) in out.chunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&order.write_f32(wire.rows[i / 4][i % 4]));
    }
    out
}
