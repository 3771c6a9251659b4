//! Schema-less struct reader.
//!
//! Drives a [`Protocol`] from field markers alone: every field carries
//! its wire type and id, which is enough to walk the whole tree without
//! an IDL. The reader owns limit enforcement (field counts, container
//! sizes, nesting depth) so the protocols stay pure byte decoders.

use crate::error::DecodeError;
use crate::field_type::FieldType;
use crate::limits::DecodeLimits;
use crate::protocol::Protocol;
use crate::value::{Field, StructValue, Value};

/// Reads one struct and everything under it.
///
/// With `read_values` false the scan is structural only: scalar values
/// are skipped (fields keep `None`), containers keep an empty shell
/// with their element types, and nested structs still recurse so the
/// field/type/id skeleton comes back complete. Bytes-consumed
/// accounting is identical in both modes.
pub fn read_struct<P: Protocol>(
    proto: &mut P,
    limits: &DecodeLimits,
    read_values: bool,
    depth: usize,
) -> Result<StructValue, DecodeError> {
    if depth >= limits.max_depth {
        return Err(DecodeError::DepthLimitExceeded(limits.max_depth));
    }
    let start = proto.bytes_read();
    proto.read_struct_begin()?;
    let mut fields = Vec::new();
    loop {
        let (ftype, id) = proto.read_field_begin()?;
        if ftype == FieldType::Stop {
            break;
        }
        if fields.len() + 1 >= limits.max_fields {
            return Err(DecodeError::TooManyFields(limits.max_fields));
        }
        let value = if read_values {
            Some(read_value(proto, ftype, limits, depth + 1)?)
        } else {
            scan_value(proto, ftype, limits, depth + 1)?
        };
        proto.read_field_end()?;
        fields.push(Field { ftype, id, value });
    }
    proto.read_struct_end()?;
    let byte_length = (proto.bytes_read() - start) as u32;
    Ok(StructValue {
        fields,
        byte_length,
    })
}

/// Reads one value of the given wire type.
pub fn read_value<P: Protocol>(
    proto: &mut P,
    ftype: FieldType,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Value, DecodeError> {
    Ok(match ftype {
        FieldType::Bool => Value::Bool(proto.read_bool()?),
        FieldType::Byte => Value::Byte(proto.read_byte()?),
        FieldType::I16 => Value::I16(proto.read_i16()?),
        FieldType::I32 => Value::I32(proto.read_i32()?),
        FieldType::I64 => Value::I64(proto.read_i64()?),
        FieldType::Double => Value::Double(proto.read_double()?),
        FieldType::String => Value::Binary(proto.read_binary()?),
        FieldType::Struct => Value::Struct(read_struct(proto, limits, true, depth)?),
        FieldType::Map => {
            let (ktype, vtype, size) = proto.read_map_begin()?;
            check_size(size, limits.max_map_size)?;
            check_depth(depth, limits)?;
            let mut pairs = Vec::with_capacity(size as usize);
            for _ in 0..size {
                let key = read_value(proto, ktype, limits, depth + 1)?;
                let value = read_value(proto, vtype, limits, depth + 1)?;
                pairs.push((key, value));
            }
            proto.read_map_end()?;
            Value::Map(ktype, vtype, pairs)
        }
        FieldType::Set => {
            let (etype, size) = proto.read_set_begin()?;
            check_size(size, limits.max_set_size)?;
            check_depth(depth, limits)?;
            let mut items = Vec::with_capacity(size as usize);
            for _ in 0..size {
                items.push(read_value(proto, etype, limits, depth + 1)?);
            }
            proto.read_set_end()?;
            Value::Set(etype, items)
        }
        FieldType::List => {
            let (etype, size) = proto.read_list_begin()?;
            check_size(size, limits.max_list_size)?;
            check_depth(depth, limits)?;
            let mut items = Vec::with_capacity(size as usize);
            for _ in 0..size {
                items.push(read_value(proto, etype, limits, depth + 1)?);
            }
            proto.read_list_end()?;
            Value::List(etype, items)
        }
        FieldType::Stop => return Err(DecodeError::UnknownTypeCode(proto.bytes_read())),
    })
}

/// Skip-mode counterpart of [`read_value`]: consumes exactly the same
/// bytes but materializes only structure.
fn scan_value<P: Protocol>(
    proto: &mut P,
    ftype: FieldType,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Option<Value>, DecodeError> {
    Ok(match ftype {
        FieldType::Struct => Some(Value::Struct(read_struct(proto, limits, false, depth)?)),
        FieldType::Map => {
            let (ktype, vtype, size) = proto.read_map_begin()?;
            check_size(size, limits.max_map_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, ktype, limits, depth + 1)?;
                skip(proto, vtype, limits, depth + 1)?;
            }
            proto.read_map_end()?;
            Some(Value::Map(ktype, vtype, Vec::new()))
        }
        FieldType::Set => {
            let (etype, size) = proto.read_set_begin()?;
            check_size(size, limits.max_set_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, etype, limits, depth + 1)?;
            }
            proto.read_set_end()?;
            Some(Value::Set(etype, Vec::new()))
        }
        FieldType::List => {
            let (etype, size) = proto.read_list_begin()?;
            check_size(size, limits.max_list_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, etype, limits, depth + 1)?;
            }
            proto.read_list_end()?;
            Some(Value::List(etype, Vec::new()))
        }
        _ => {
            skip(proto, ftype, limits, depth)?;
            None
        }
    })
}

/// Consumes one value of the given type without keeping it.
pub fn skip<P: Protocol>(
    proto: &mut P,
    ftype: FieldType,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<(), DecodeError> {
    match ftype {
        FieldType::Bool => {
            proto.read_bool()?;
        }
        FieldType::Byte => {
            proto.read_byte()?;
        }
        FieldType::I16 => {
            proto.read_i16()?;
        }
        FieldType::I32 => {
            proto.read_i32()?;
        }
        FieldType::I64 => {
            proto.read_i64()?;
        }
        FieldType::Double => {
            proto.read_double()?;
        }
        FieldType::String => {
            proto.read_binary()?;
        }
        FieldType::Struct => {
            check_depth(depth, limits)?;
            proto.read_struct_begin()?;
            let mut nfields = 0usize;
            loop {
                let (ftype, _) = proto.read_field_begin()?;
                if ftype == FieldType::Stop {
                    break;
                }
                nfields += 1;
                if nfields >= limits.max_fields {
                    return Err(DecodeError::TooManyFields(limits.max_fields));
                }
                skip(proto, ftype, limits, depth + 1)?;
                proto.read_field_end()?;
            }
            proto.read_struct_end()?;
        }
        FieldType::Map => {
            let (ktype, vtype, size) = proto.read_map_begin()?;
            check_size(size, limits.max_map_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, ktype, limits, depth + 1)?;
                skip(proto, vtype, limits, depth + 1)?;
            }
            proto.read_map_end()?;
        }
        FieldType::Set => {
            let (etype, size) = proto.read_set_begin()?;
            check_size(size, limits.max_set_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, etype, limits, depth + 1)?;
            }
            proto.read_set_end()?;
        }
        FieldType::List => {
            let (etype, size) = proto.read_list_begin()?;
            check_size(size, limits.max_list_size)?;
            check_depth(depth, limits)?;
            for _ in 0..size {
                skip(proto, etype, limits, depth + 1)?;
            }
            proto.read_list_end()?;
        }
        FieldType::Stop => return Err(DecodeError::UnknownTypeCode(proto.bytes_read())),
    }
    Ok(())
}

fn check_size(size: u32, limit: u32) -> Result<(), DecodeError> {
    if size > limit {
        return Err(DecodeError::ContainerTooLarge { size, limit });
    }
    Ok(())
}

fn check_depth(depth: usize, limits: &DecodeLimits) -> Result<(), DecodeError> {
    if depth >= limits.max_depth {
        return Err(DecodeError::DepthLimitExceeded(limits.max_depth));
    }
    Ok(())
}
