//! Thrift field type tags.

use crate::error::DecodeError;

/// Wire type tag of a struct field or container element.
///
/// The discriminants are the binary-protocol type bytes; the compact
/// and JSON protocols map their own encodings onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    Stop = 0,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl FieldType {
    /// Maps a binary-protocol type byte to a tag. Anything outside the
    /// closed set is rejected; the generic reader never dispatches on
    /// an unchecked byte.
    pub fn from_wire(byte: u8, offset: usize) -> Result<FieldType, DecodeError> {
        Ok(match byte {
            0 => FieldType::Stop,
            2 => FieldType::Bool,
            3 => FieldType::Byte,
            4 => FieldType::Double,
            6 => FieldType::I16,
            8 => FieldType::I32,
            10 => FieldType::I64,
            11 => FieldType::String,
            12 => FieldType::Struct,
            13 => FieldType::Map,
            14 => FieldType::Set,
            15 => FieldType::List,
            _ => return Err(DecodeError::UnknownTypeCode(offset)),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Stop => "stop",
            FieldType::Bool => "bool",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::I16 => "i16",
            FieldType::I32 => "i32",
            FieldType::I64 => "i64",
            FieldType::String => "string",
            FieldType::Struct => "struct",
            FieldType::Map => "map",
            FieldType::Set => "set",
            FieldType::List => "list",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes_roundtrip() {
        for byte in [0u8, 2, 3, 4, 6, 8, 10, 11, 12, 13, 14, 15] {
            let t = FieldType::from_wire(byte, 0).unwrap();
            assert_eq!(t as u8, byte);
        }
    }

    #[test]
    fn unknown_wire_byte_rejected() {
        for byte in [1u8, 5, 7, 9, 16, 0xff] {
            assert_eq!(
                FieldType::from_wire(byte, 7),
                Err(DecodeError::UnknownTypeCode(7))
            );
        }
    }
}
