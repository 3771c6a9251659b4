//! Wire protocol readers and the contract they share.

pub(crate) mod binary;
mod compact;
mod json;

pub use binary::BinaryProtocol;
pub use compact::CompactProtocol;
pub use json::JsonProtocol;

use crate::error::DecodeError;
use crate::field_type::FieldType;
use crate::value::MessageKind;

/// The shared decode contract every wire format implements.
///
/// A protocol instance owns its cursor and whatever internal state the
/// format needs (the compact state machine, the JSON context stack); it
/// lives for exactly one decode call. The generic reader drives these
/// methods and never touches bytes directly.
pub trait Protocol {
    fn read_message_begin(&mut self) -> Result<(String, MessageKind, i32), DecodeError>;
    fn read_message_end(&mut self) -> Result<(), DecodeError>;

    fn read_struct_begin(&mut self) -> Result<(), DecodeError>;
    fn read_struct_end(&mut self) -> Result<(), DecodeError>;
    /// Returns `(FieldType::Stop, 0)` at the end of a field list.
    fn read_field_begin(&mut self) -> Result<(FieldType, i16), DecodeError>;
    fn read_field_end(&mut self) -> Result<(), DecodeError>;

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32), DecodeError>;
    fn read_map_end(&mut self) -> Result<(), DecodeError>;
    fn read_set_begin(&mut self) -> Result<(FieldType, u32), DecodeError>;
    fn read_set_end(&mut self) -> Result<(), DecodeError>;
    fn read_list_begin(&mut self) -> Result<(FieldType, u32), DecodeError>;
    fn read_list_end(&mut self) -> Result<(), DecodeError>;

    fn read_bool(&mut self) -> Result<bool, DecodeError>;
    fn read_byte(&mut self) -> Result<i8, DecodeError>;
    fn read_i16(&mut self) -> Result<i16, DecodeError>;
    fn read_i32(&mut self) -> Result<i32, DecodeError>;
    fn read_i64(&mut self) -> Result<i64, DecodeError>;
    fn read_double(&mut self) -> Result<f64, DecodeError>;
    fn read_string(&mut self) -> Result<String, DecodeError>;
    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError>;

    /// Cumulative bytes consumed from the buffer.
    fn bytes_read(&self) -> usize;
}

/// Which wire format a buffer uses. Resolved once per decode call;
/// dispatch from then on is static.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    Binary,
    Compact,
    Json,
}

impl ProtocolVariant {
    /// Parses the protocol names the command-line surface historically
    /// accepted.
    pub fn from_name(name: &str) -> Option<ProtocolVariant> {
        match name {
            "binary" | "tbinary" => Some(ProtocolVariant::Binary),
            "compact" | "tcompact" => Some(ProtocolVariant::Compact),
            "json" | "tjson" => Some(ProtocolVariant::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVariant::Binary => "binary",
            ProtocolVariant::Compact => "compact",
            ProtocolVariant::Json => "json",
        }
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
