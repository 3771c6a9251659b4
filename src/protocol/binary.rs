//! TBinaryProtocol reader.

use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::field_type::FieldType;
use crate::value::MessageKind;

use super::Protocol;

pub(crate) const VERSION_MASK: i32 = -65536; // 0xffff0000
pub(crate) const VERSION_1: i32 = -2147418112; // 0x80010000
const TYPE_MASK: i32 = 0xff;

/// Big-endian, fixed-width wire format. Stateless beyond the cursor:
/// struct/field/container ends are all no-ops on the wire.
pub struct BinaryProtocol<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> BinaryProtocol<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
        }
    }

    #[inline]
    fn be_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        for b in &mut buf {
            *b = self.cursor.next()?;
        }
        Ok(buf)
    }

    fn read_size(&mut self) -> Result<u32, DecodeError> {
        let offset = self.cursor.bytes_read();
        let size = self.read_i32()?;
        if size < 0 {
            return Err(DecodeError::InvalidSize(offset));
        }
        Ok(size as u32)
    }
}

impl Protocol for BinaryProtocol<'_> {
    fn read_message_begin(&mut self) -> Result<(String, MessageKind, i32), DecodeError> {
        let offset = self.cursor.bytes_read();
        let word = self.read_i32()?;
        if word < 0 {
            if word & VERSION_MASK != VERSION_1 {
                return Err(DecodeError::BadVersion(offset));
            }
            let kind = MessageKind::from_wire(word & TYPE_MASK);
            let method = self.read_string()?;
            let seq_id = self.read_i32()?;
            return Ok((method, kind, seq_id));
        }
        // Legacy unversioned header: the word is the method name length
        // and must leave room for the name, a kind byte and the seqid.
        let name_len = word as usize;
        if self.cursor.bytes_read() + name_len + 5 > self.cursor.len() {
            return Err(DecodeError::Truncated(self.cursor.bytes_read()));
        }
        let name_offset = self.cursor.bytes_read();
        let name = self.cursor.take(name_len)?;
        let method =
            String::from_utf8(name).map_err(|_| DecodeError::InvalidUtf8(name_offset))?;
        let kind = MessageKind::from_wire(self.cursor.next()? as i32);
        let seq_id = self.read_i32()?;
        Ok((method, kind, seq_id))
    }

    fn read_message_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<(FieldType, i16), DecodeError> {
        let offset = self.cursor.bytes_read();
        let byte = self.cursor.next()?;
        if byte == 0 {
            return Ok((FieldType::Stop, 0));
        }
        let ftype = FieldType::from_wire(byte, offset)?;
        let id = self.read_i16()?;
        Ok((ftype, id))
    }

    fn read_field_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32), DecodeError> {
        let offset = self.cursor.bytes_read();
        let ktype = FieldType::from_wire(self.cursor.next()?, offset)?;
        let offset = self.cursor.bytes_read();
        let vtype = FieldType::from_wire(self.cursor.next()?, offset)?;
        let size = self.read_size()?;
        Ok((ktype, vtype, size))
    }

    fn read_map_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        let offset = self.cursor.bytes_read();
        let etype = FieldType::from_wire(self.cursor.next()?, offset)?;
        let size = self.read_size()?;
        Ok((etype, size))
    }

    fn read_set_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        let offset = self.cursor.bytes_read();
        let etype = FieldType::from_wire(self.cursor.next()?, offset)?;
        let size = self.read_size()?;
        Ok((etype, size))
    }

    fn read_list_end(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.cursor.next()? != 0)
    }

    fn read_byte(&mut self) -> Result<i8, DecodeError> {
        Ok(self.cursor.next()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.be_bytes::<2>()?))
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.be_bytes::<4>()?))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.be_bytes::<8>()?))
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.be_bytes::<8>()?))
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
