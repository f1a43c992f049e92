//! Wire byte order selection

use serde::{Deserialize, Serialize};

/// Byte order of every multi-byte field on the wire.
///
/// The server builds disagree on this, so it is always configured explicitly:
///
/// | Server build | Byte order |
/// |---|---|
/// | HoloROS publisher (`DataWriter.ByteOrder = LittleEndian`) | [`ByteOrder::Little`] |
/// | Older streamers using the `DataWriter` default | [`ByteOrder::Big`] |
/// | Viewers unpacking with host layout (`@` struct formats) | [`ByteOrder::Native`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
    /// Whatever the receiving host uses.
    Native,
}

impl ByteOrder {
    /// Resolve `Native` to the concrete order of this host.
    pub fn is_little(self) -> bool {
        match self {
            ByteOrder::Little => true,
            ByteOrder::Big => false,
            ByteOrder::Native => cfg!(target_endian = "little"),
        }
    }

    pub fn read_u16(self, bytes: [u8; 2]) -> u16 {
        if self.is_little() { u16::from_le_bytes(bytes) } else { u16::from_be_bytes(bytes) }
    }

    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        if self.is_little() { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) }
    }

    pub fn read_i64(self, bytes: [u8; 8]) -> i64 {
        if self.is_little() { i64::from_le_bytes(bytes) } else { i64::from_be_bytes(bytes) }
    }

    pub fn read_f32(self, bytes: [u8; 4]) -> f32 {
        f32::from_bits(self.read_u32(bytes))
    }

    pub fn write_u16(self, value: u16) -> [u8; 2] {
        if self.is_little() { value.to_le_bytes() } else { value.to_be_bytes() }
    }

    pub fn write_u32(self, value: u32) -> [u8; 4] {
        if self.is_little() { value.to_le_bytes() } else { value.to_be_bytes() }
    }

    pub fn write_i64(self, value: i64) -> [u8; 8] {
        if self.is_little() { value.to_le_bytes() } else { value.to_be_bytes() }
    }

    pub fn write_f32(self, value: f32) -> [u8; 4] {
        self.write_u32(value.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_and_big_disagree_on_the_same_bytes() {
        let bytes = [0x01, 0x00, 0x00, 0x00];
        assert_eq!(ByteOrder::Little.read_u32(bytes), 1);
        assert_eq!(ByteOrder::Big.read_u32(bytes), 0x0100_0000);
    }

    #[test]
    fn native_matches_host() {
        assert_eq!(ByteOrder::Native.read_u16(7u16.to_ne_bytes()), 7);
        assert_eq!(ByteOrder::Native.is_little(), cfg!(target_endian = "little"));
    }

    #[test]
    fn float_bits_survive_both_orders() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let value = -1234.5678_f32;
            assert_eq!(order.read_f32(order.write_f32(value)).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn deserializes_from_snake_case() {
        let order: ByteOrder = serde_yaml_ng::from_str("big").expect("valid yaml");
        assert_eq!(order, ByteOrder::Big);
    }
}
