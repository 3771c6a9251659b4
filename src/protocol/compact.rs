//! TCompactProtocol reader.
//!
//! Compact is the only stateful binary format: every field/struct/
//! container operation is legal in some decoder states and not others,
//! and field ids are delta-encoded against the previous field of the
//! enclosing struct. Struct nesting saves `(state, last_field_id)` on
//! one stack; container nesting saves the state on another, because
//! structs and containers nest independently.

use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::field_type::FieldType;
use crate::value::MessageKind;

use super::Protocol;

const PROTOCOL_ID: u8 = 0x82;
const VERSION: u8 = 1;
const VERSION_MASK: u8 = 0x1f;
const KIND_SHIFT: u8 = 5;
const KIND_BITS: u8 = 0x07;
const TYPE_BOOL_TRUE: u8 = 1;
const TYPE_BOOL_FALSE: u8 = 2;

/// Decoder state. Must be back to `Clear`, with both stacks empty, by
/// the time the message ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Clear,
    FieldRead,
    ValueRead,
    ContainerRead,
    BoolRead,
}

pub struct CompactProtocol<'a> {
    cursor: ByteCursor<'a>,
    state: State,
    last_field_id: i16,
    /// Bool fields carry their value inside the field-begin type
    /// nibble; it is stashed here for the following `read_bool`.
    bool_value: Option<bool>,
    structs: Vec<(State, i16)>,
    containers: Vec<State>,
}

/// Maps a compact type nibble to a field type.
fn nibble_type(nibble: u8, offset: usize) -> Result<FieldType, DecodeError> {
    Ok(match nibble {
        0 => FieldType::Stop,
        1 | 2 => FieldType::Bool,
        3 => FieldType::Byte,
        4 => FieldType::I16,
        5 => FieldType::I32,
        6 => FieldType::I64,
        7 => FieldType::Double,
        8 => FieldType::String,
        9 => FieldType::List,
        10 => FieldType::Set,
        11 => FieldType::Map,
        12 => FieldType::Struct,
        _ => return Err(DecodeError::UnknownTypeCode(offset)),
    })
}

fn from_zig_zag(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

impl<'a> CompactProtocol<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            state: State::Clear,
            last_field_id: 0,
            bool_value: None,
            structs: Vec::new(),
            containers: Vec::new(),
        }
    }

    fn wrong_state(&self) -> DecodeError {
        DecodeError::WrongDecoderState(self.cursor.bytes_read())
    }

    /// Little-endian base-128 varint, capped at 10 bytes (enough for
    /// any u64; the wire has no cap of its own).
    fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.cursor.bytes_read();
        let mut result = 0u64;
        for i in 0..10 {
            let byte = self.cursor.next()?;
            result |= ((byte & 0x7f) as u64) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::VarintTooLong(start))
    }

    /// Zig-zag varint; only legal while reading a field value or a
    /// container element.
    fn read_zig_zag(&mut self) -> Result<i64, DecodeError> {
        if self.state != State::ValueRead && self.state != State::ContainerRead {
            return Err(self.wrong_state());
        }
        Ok(from_zig_zag(self.read_varint()?))
    }

    fn read_size(&mut self) -> Result<u32, DecodeError> {
        let offset = self.cursor.bytes_read();
        let size = self.read_varint()?;
        if size > i32::MAX as u64 {
            return Err(DecodeError::InvalidSize(offset));
        }
        Ok(size as u32)
    }
}

impl Protocol for CompactProtocol<'_> {
    fn read_message_begin(&mut self) -> Result<(String, MessageKind, i32), DecodeError> {
        if self.state != State::Clear {
            return Err(self.wrong_state());
        }
        let offset = self.cursor.bytes_read();
        if self.cursor.next()? != PROTOCOL_ID {
            return Err(DecodeError::BadProtocolId(offset));
        }
        let offset = self.cursor.bytes_read();
        let ver_kind = self.cursor.next()?;
        if ver_kind & VERSION_MASK != VERSION {
            return Err(DecodeError::BadCompactVersion(offset));
        }
        let kind = MessageKind::from_wire(((ver_kind >> KIND_SHIFT) & KIND_BITS) as i32);
        let seq_id = self.read_varint()? as i32;
        let offset = self.cursor.bytes_read();
        let method = self.read_binary()?;
        let method =
            String::from_utf8(method).map_err(|_| DecodeError::InvalidUtf8(offset))?;
        Ok((method, kind, seq_id))
    }

    fn read_message_end(&mut self) -> Result<(), DecodeError> {
        if self.state != State::Clear || !self.structs.is_empty() || !self.containers.is_empty() {
            return Err(self.wrong_state());
        }
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<(), DecodeError> {
        match self.state {
            State::Clear | State::ContainerRead | State::ValueRead => {}
            _ => return Err(self.wrong_state()),
        }
        self.structs.push((self.state, self.last_field_id));
        self.state = State::FieldRead;
        self.last_field_id = 0;
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), DecodeError> {
        if self.state != State::FieldRead {
            return Err(self.wrong_state());
        }
        let (state, last_field_id) = self.structs.pop().ok_or_else(|| self.wrong_state())?;
        self.state = state;
        self.last_field_id = last_field_id;
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<(FieldType, i16), DecodeError> {
        if self.state != State::FieldRead {
            return Err(self.wrong_state());
        }
        let offset = self.cursor.bytes_read();
        let byte = self.cursor.next()?;
        let nibble = byte & 0x0f;
        if nibble == 0 {
            return Ok((FieldType::Stop, 0));
        }
        let delta = byte >> 4;
        let id = if delta == 0 {
            from_zig_zag(self.read_varint()?) as i16
        } else {
            self.last_field_id.wrapping_add(delta as i16)
        };
        self.last_field_id = id;
        let ftype = match nibble {
            TYPE_BOOL_TRUE => {
                self.state = State::BoolRead;
                self.bool_value = Some(true);
                FieldType::Bool
            }
            TYPE_BOOL_FALSE => {
                self.state = State::BoolRead;
                self.bool_value = Some(false);
                FieldType::Bool
            }
            _ => {
                self.state = State::ValueRead;
                nibble_type(nibble, offset)?
            }
        };
        Ok((ftype, id))
    }

    fn read_field_end(&mut self) -> Result<(), DecodeError> {
        if self.state != State::BoolRead && self.state != State::ValueRead {
            return Err(self.wrong_state());
        }
        self.state = State::FieldRead;
        self.bool_value = None;
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32), DecodeError> {
        if self.state != State::ValueRead && self.state != State::ContainerRead {
            return Err(self.wrong_state());
        }
        let size = self.read_size()?;
        let offset = self.cursor.bytes_read();
        let kv = if size > 0 { self.cursor.next()? } else { 0 };
        let ktype = nibble_type(kv >> 4, offset)?;
        let vtype = nibble_type(kv & 0x0f, offset)?;
        self.containers.push(self.state);
        self.state = State::ContainerRead;
        Ok((ktype, vtype, size))
    }

    fn read_map_end(&mut self) -> Result<(), DecodeError> {
        if self.state != State::ContainerRead {
            return Err(self.wrong_state());
        }
        self.state = self.containers.pop().ok_or_else(|| self.wrong_state())?;
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        self.read_list_begin()
    }

    fn read_set_end(&mut self) -> Result<(), DecodeError> {
        self.read_map_end()
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        if self.state != State::ValueRead && self.state != State::ContainerRead {
            return Err(self.wrong_state());
        }
        let offset = self.cursor.bytes_read();
        let byte = self.cursor.next()?;
        let etype = nibble_type(byte & 0x0f, offset)?;
        let mut size = (byte >> 4) as u32;
        if size == 15 {
            size = self.read_size()?;
        }
        self.containers.push(self.state);
        self.state = State::ContainerRead;
        Ok((etype, size))
    }

    fn read_list_end(&mut self) -> Result<(), DecodeError> {
        self.read_map_end()
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.state {
            State::BoolRead => self.bool_value.ok_or_else(|| self.wrong_state()),
            State::ContainerRead => Ok(self.cursor.next()? == TYPE_BOOL_TRUE),
            _ => Err(self.wrong_state()),
        }
    }

    fn read_byte(&mut self) -> Result<i8, DecodeError> {
        Ok(self.cursor.next()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.read_zig_zag()? as i16)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_zig_zag()? as i32)
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.read_zig_zag()
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        let mut buf = [0u8; 8];
        for b in &mut buf {
            *b = self.cursor.next()?;
        }
        Ok(f64::from_le_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.cursor.bytes_read();
        let bytes = self.read_binary()?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(offset))
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        let size = self.read_size()?;
        self.cursor.take(size as usize)
    }

    fn bytes_read(&self) -> usize {
        self.cursor.bytes_read()
    }
}
