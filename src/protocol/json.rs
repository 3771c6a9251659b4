//! TJSON protocol reader.
//!
//! The wire text is plain JSON with a rigid shape:
//! `[1,"method",kind,seqid,{...}]`. Separator discipline is tracked
//! with a context stack: inside an object (`Pair`) reads alternate
//! between `:` and `,`, inside an array (`List`) every read after the
//! first expects `,`. A number in key position is quoted, so integer
//! reads consult the top context before lexing.

use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::field_type::FieldType;
use crate::value::MessageKind;

use super::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Base,
    Pair,
    List,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    kind: ContextKind,
    first: bool,
    colon: bool,
}

impl Context {
    fn base() -> Self {
        Context {
            kind: ContextKind::Base,
            first: true,
            colon: false,
        }
    }

    fn pair() -> Self {
        Context {
            kind: ContextKind::Pair,
            first: true,
            colon: true,
        }
    }

    fn list() -> Self {
        Context {
            kind: ContextKind::List,
            first: true,
            colon: false,
        }
    }
}

/// Maps a wire type name to a field type.
fn name_type(name: &[u8], offset: usize) -> Result<FieldType, DecodeError> {
    Ok(match name {
        b"tf" => FieldType::Bool,
        b"i8" => FieldType::Byte,
        b"dbl" => FieldType::Double,
        b"i16" => FieldType::I16,
        b"i32" => FieldType::I32,
        b"i64" => FieldType::I64,
        b"str" => FieldType::String,
        b"rec" => FieldType::Struct,
        b"map" => FieldType::Map,
        b"set" => FieldType::Set,
        b"lst" => FieldType::List,
        _ => return Err(DecodeError::UnknownTypeCode(offset)),
    })
}

pub struct JsonProtocol<'a> {
    cursor: ByteCursor<'a>,
    contexts: Vec<Context>,
}

impl<'a> JsonProtocol<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            contexts: vec![Context::base()],
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), DecodeError> {
        let offset = self.cursor.bytes_read();
        let byte = self.cursor.next()?;
        if byte != expected {
            return Err(DecodeError::UnexpectedJsonChar {
                ch: byte as char,
                offset,
            });
        }
        Ok(())
    }

    /// Consumes whatever separator the enclosing context calls for
    /// before the next element is read.
    fn context_read(&mut self) -> Result<(), DecodeError> {
        let top = self.contexts.last_mut().expect("base context never popped");
        match top.kind {
            ContextKind::Base => Ok(()),
            ContextKind::List => {
                if top.first {
                    top.first = false;
                    Ok(())
                } else {
                    self.expect(b',')
                }
            }
            ContextKind::Pair => {
                if top.first {
                    top.first = false;
                    top.colon = true;
                    Ok(())
                } else {
                    let sep = if top.colon { b':' } else { b',' };
                    top.colon = !top.colon;
                    self.expect(sep)
                }
            }
        }
    }

    /// True when the next value sits in object-key position, where
    /// numbers appear quoted.
    fn escape_num(&self) -> bool {
        let top = self.contexts.last().expect("base context never popped");
        top.kind == ContextKind::Pair && top.colon
    }

    fn push(&mut self, ctx: Context) {
        self.contexts.push(ctx);
    }

    fn pop(&mut self) -> Result<(), DecodeError> {
        if self.contexts.len() <= 1 {
            return Err(DecodeError::WrongDecoderState(self.cursor.bytes_read()));
        }
        self.contexts.pop();
        Ok(())
    }

    fn array_start(&mut self) -> Result<(), DecodeError> {
        self.context_read()?;
        self.expect(b'[')?;
        self.push(Context::list());
        Ok(())
    }

    fn array_end(&mut self) -> Result<(), DecodeError> {
        self.expect(b']')?;
        self.pop()
    }

    fn object_start(&mut self) -> Result<(), DecodeError> {
        self.context_read()?;
        self.expect(b'{')?;
        self.push(Context::pair());
        Ok(())
    }

    fn object_end(&mut self) -> Result<(), DecodeError> {
        self.expect(b'}')?;
        self.pop()
    }

    fn hex_nibble(&mut self) -> Result<u16, DecodeError> {
        let offset = self.cursor.bytes_read();
        let byte = self.cursor.next()?;
        match byte {
            b'0'..=b'9' => Ok((byte - b'0') as u16),
            b'a'..=b'f' => Ok((byte - b'a' + 10) as u16),
            b'A'..=b'F' => Ok((byte - b'A' + 10) as u16),
            _ => Err(DecodeError::UnexpectedJsonChar {
                ch: byte as char,
                offset,
            }),
        }
    }

    /// Reads the raw bytes of a JSON string literal, resolving escapes.
    /// `\uXXXX` escapes re-encode as UTF-8, with surrogate pairs
    /// combined into the astral code point they name.
    fn read_string_bytes(&mut self, skip_context: bool) -> Result<Vec<u8>, DecodeError> {
        if !skip_context {
            self.context_read()?;
        }
        self.expect(b'"')?;
        let start = self.cursor.bytes_read();
        let mut out = Vec::new();
        // A high surrogate waiting for its low half.
        let mut pending: Option<u16> = None;
        loop {
            let offset = self.cursor.bytes_read();
            let byte = self
                .cursor
                .next()
                .map_err(|_| DecodeError::UnterminatedString(start))?;
            if byte == b'"' {
                if pending.is_some() {
                    return Err(DecodeError::BadSurrogatePair(offset));
                }
                return Ok(out);
            }
            if byte == b'\\' {
                let esc_offset = self.cursor.bytes_read();
                let esc = self
                    .cursor
                    .next()
                    .map_err(|_| DecodeError::UnterminatedString(start))?;
                if esc == b'u' {
                    let mut code = 0u16;
                    for _ in 0..4 {
                        code = (code << 4) | self.hex_nibble()?;
                    }
                    match code {
                        0xd800..=0xdbff => {
                            if pending.is_some() {
                                return Err(DecodeError::BadSurrogatePair(esc_offset));
                            }
                            pending = Some(code);
                        }
                        0xdc00..=0xdfff => {
                            let high = pending
                                .take()
                                .ok_or(DecodeError::BadSurrogatePair(esc_offset))?;
                            let cp = 0x10000
                                + (((high as u32) & 0x3ff) << 10)
                                + ((code as u32) & 0x3ff);
                            let ch = char::from_u32(cp)
                                .ok_or(DecodeError::BadSurrogatePair(esc_offset))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        }
                        _ => {
                            if pending.is_some() {
                                return Err(DecodeError::BadSurrogatePair(esc_offset));
                            }
                            let ch = char::from_u32(code as u32)
                                .ok_or(DecodeError::BadSurrogatePair(esc_offset))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        }
                    }
                    continue;
                }
                if pending.is_some() {
                    return Err(DecodeError::BadSurrogatePair(esc_offset));
                }
                let resolved = match esc {
                    b'"' => b'"',
                    b'\\' => b'\\',
                    b'/' => b'/',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    _ => {
                        return Err(DecodeError::UnexpectedJsonChar {
                            ch: esc as char,
                            offset: esc_offset,
                        })
                    }
                };
                out.push(resolved);
                continue;
            }
            if pending.is_some() {
                return Err(DecodeError::BadSurrogatePair(offset));
            }
            if byte < 0x20 {
                return Err(DecodeError::UnescapedControlChar(offset));
            }
            out.push(byte);
        }
    }

    /// Lexes an integer, unquoting it when it sits in key position.
    fn read_integer(&mut self) -> Result<i64, DecodeError> {
        self.context_read()?;
        let quoted = self.escape_num();
        if quoted {
            self.expect(b'"')?;
        }
        let offset = self.cursor.bytes_read();
        let mut text = String::new();
        if let Ok(b'-') = self.cursor.peek() {
            self.cursor.next()?;
            text.push('-');
        }
        while let Ok(byte) = self.cursor.peek() {
            if !byte.is_ascii_digit() {
                break;
            }
            self.cursor.next()?;
            text.push(byte as char);
        }
        let value = text.parse::<i64>().map_err(|_| {
            DecodeError::UnexpectedJsonChar {
                ch: self.cursor.peek().map(|b| b as char).unwrap_or('"'),
                offset,
            }
        })?;
        if quoted {
            self.expect(b'"')?;
        }
        Ok(value)
    }

    fn read_type_name(&mut self) -> Result<FieldType, DecodeError> {
        let offset = self.cursor.bytes_read();
        let name = self.read_string_bytes(false)?;
        name_type(&name, offset)
    }
}

impl Protocol for JsonProtocol<'_> {
    fn read_message_begin(&mut self) -> Result<(String, MessageKind, i32), DecodeError> {
        self.array_start()?;
        let offset = self.cursor.bytes_read();
        if self.read_integer()? != 1 {
            return Err(DecodeError::BadVersion(offset));
        }
        let method = self.read_string()?;
        let kind = MessageKind::from_wire(self.read_integer()? as i32);
        let seq_id = self.read_integer()? as i32;
        Ok((method, kind, seq_id))
    }

    fn read_message_end(&mut self) -> Result<(), DecodeError> {
        self.array_end()
    }

    fn read_struct_begin(&mut self) -> Result<(), DecodeError> {
        self.object_start()
    }

    fn read_struct_end(&mut self) -> Result<(), DecodeError> {
        self.object_end()
    }

    fn read_field_begin(&mut self) -> Result<(FieldType, i16), DecodeError> {
        if self.cursor.peek()? == b'}' {
            return Ok((FieldType::Stop, 0));
        }
        let id = self.read_integer()? as i16;
        self.object_start()?;
        let ftype = self.read_type_name()?;
        Ok((ftype, id))
    }

    fn read_field_end(&mut self) -> Result<(), DecodeError> {
        self.object_end()
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32), DecodeError> {
        self.array_start()?;
        let ktype = self.read_type_name()?;
        let vtype = self.read_type_name()?;
        let offset = self.cursor.bytes_read();
        let size = self.read_integer()?;
        if size < 0 || size > i32::MAX as i64 {
            return Err(DecodeError::InvalidSize(offset));
        }
        self.object_start()?;
        Ok((ktype, vtype, size as u32))
    }

    fn read_map_end(&mut self) -> Result<(), DecodeError> {
        self.object_end()?;
        self.array_end()
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        self.read_list_begin()
    }

    fn read_set_end(&mut self) -> Result<(), DecodeError> {
        self.array_end()
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, u32), DecodeError> {
        self.array_start()?;
        let etype = self.read_type_name()?;
        let offset = self.cursor.bytes_read();
        let size = self.read_integer()?;
        if size < 0 || size > i32::MAX as i64 {
            return Err(DecodeError::InvalidSize(offset));
        }
        Ok((etype, size as u32))
    }

    fn read_list_end(&mut self) -> Result<(), DecodeError> {
        self.array_end()
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_integer()? != 0)
    }

    fn read_byte(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_integer()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.read_integer()? as i16)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_integer()? as i32)
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.read_integer()
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.context_read()?;
        let offset = self.cursor.bytes_read();
        if self.cursor.peek()? == b'"' {
            // NaN and the infinities travel as quoted strings, as does
            // any double in key position.
            let text = self.read_string_bytes(true)?;
            let text =
                String::from_utf8(text).map_err(|_| DecodeError::InvalidUtf8(offset))?;
            return text
                .parse::<f64>()
                .map_err(|_| DecodeError::UnexpectedJsonChar { ch: '"', offset });
        }
        let mut text = String::new();
        while let Ok(byte) = self.cursor.peek() {
            match byte {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => {
                    self.cursor.next()?;
                    text.push(byte as char);
                }
                _ => break,
            }
        }
        text.parse::<f64>().map_err(|_| {
            DecodeError::UnexpectedJsonChar {
                ch: self.cursor.peek().map(|b| b as char).unwrap_or(' '),
                offset,
            }
        })
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.cursor.bytes_read();
        let bytes = self.read_string_bytes(false)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(offset))
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.read_string_bytes(false)
    }

    fn bytes_read(&self) -> usize {
        self.cursor.bytes_read()
    }
}
