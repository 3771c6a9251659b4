//! Schema-less Thrift message decoder.
//!
//! Decodes complete Thrift messages from raw bytes without an IDL:
//! every field on the wire carries its type and numeric id, which is
//! enough to reconstruct the full value tree. Three wire formats are
//! supported (binary, compact and JSON), sniffable from the leading
//! bytes, with exact bytes-consumed accounting for every message and
//! struct decoded.
//!
//! ```
//! use thrift_wire::{decode_message, DecodeOptions};
//!
//! // Versioned binary "ping" call with an empty argument struct.
//! let mut data = vec![0x80, 0x01, 0x00, 0x01];
//! data.extend_from_slice(&4u32.to_be_bytes());
//! data.extend_from_slice(b"ping");
//! data.extend_from_slice(&1u32.to_be_bytes());
//! data.push(0x00);
//!
//! let (msg, consumed) = decode_message(&data, &DecodeOptions::default()).unwrap();
//! assert_eq!(msg.method, "ping");
//! assert_eq!(consumed as usize, data.len());
//! ```

pub mod cursor;
pub mod detect;
pub mod error;
pub mod field_type;
pub mod limits;
pub mod message;
pub mod protocol;
pub mod reader;
pub mod value;

pub use cursor::ByteCursor;
pub use detect::detect;
pub use error::DecodeError;
pub use field_type::FieldType;
pub use limits::{DecodeLimits, DecodeOptions};
pub use message::decode_message;
pub use protocol::{
    BinaryProtocol, CompactProtocol, JsonProtocol, Protocol, ProtocolVariant,
};
pub use value::{Field, Message, MessageKind, StructValue, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(mut n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (n & 0x7f) as u8;
            n >>= 7;
            if n == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
        out
    }

    fn zig_zag(n: i64) -> u64 {
        ((n << 1) ^ (n >> 63)) as u64
    }

    fn field_value<'a>(msg: &'a Message, id: i16) -> &'a Value {
        msg.body
            .fields
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.value.as_ref())
            .expect("field with value")
    }

    #[test]
    fn binary_call_with_one_i32_field() {
        let mut data = vec![0x80, 0x01, 0x00, 0x01];
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(b"ping");
        data.extend_from_slice(&9u32.to_be_bytes());
        data.extend_from_slice(&[0x08, 0x00, 0x01]);
        data.extend_from_slice(&42i32.to_be_bytes());
        data.push(0x00);

        let (msg, consumed) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.method, "ping");
        assert_eq!(msg.kind, MessageKind::Call);
        assert_eq!(msg.seq_id, 9);
        assert_eq!(field_value(&msg, 1), &Value::I32(42));
        assert_eq!(consumed as usize, data.len());
        // Envelope is 16 bytes; the body struct is field (7) + stop (1).
        assert_eq!(msg.body.byte_length, 8);
    }

    #[test]
    fn binary_scalars_decode_bit_exact() {
        let mut data = vec![0x80, 0x01, 0x00, 0x02]; // reply
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(b'm');
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0x02, 0x00, 0x01, 0x01]); // bool true
        data.extend_from_slice(&[0x03, 0x00, 0x02, 0x80]); // byte -128
        data.extend_from_slice(&[0x06, 0x00, 0x03]);
        data.extend_from_slice(&(-2i16).to_be_bytes());
        data.extend_from_slice(&[0x0a, 0x00, 0x04]);
        data.extend_from_slice(&i64::MIN.to_be_bytes());
        data.extend_from_slice(&[0x04, 0x00, 0x05]);
        data.extend_from_slice(&(-0.0f64).to_be_bytes());
        data.push(0x00);

        let (msg, _) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.kind, MessageKind::Reply);
        assert_eq!(field_value(&msg, 1), &Value::Bool(true));
        assert_eq!(field_value(&msg, 2), &Value::Byte(-128));
        assert_eq!(field_value(&msg, 3), &Value::I16(-2));
        assert_eq!(field_value(&msg, 4), &Value::I64(i64::MIN));
        match field_value(&msg, 5) {
            Value::Double(d) => assert_eq!(d.to_bits(), (-0.0f64).to_bits()),
            other => panic!("expected double, got {other:?}"),
        }
    }

    #[test]
    fn legacy_binary_uses_fallback() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(b"ping");
        data.push(0x04); // oneway
        data.extend_from_slice(&3u32.to_be_bytes());
        data.push(0x00);

        assert_eq!(detect(&data), None);
        let (msg, consumed) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.method, "ping");
        assert_eq!(msg.kind, MessageKind::Oneway);
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn compact_call_decodes_end_to_end() {
        let mut data = vec![0x82, 0x21]; // call, version 1
        data.extend_from_slice(&varint(5)); // seqid
        data.extend_from_slice(&varint(4));
        data.extend_from_slice(b"ping");
        data.push(0x15); // field 1, i32
        data.extend_from_slice(&varint(zig_zag(-42)));
        data.push(0x11); // field 2, bool true inline
        data.push(0x00); // stop

        assert_eq!(detect(&data), Some(ProtocolVariant::Compact));
        let (msg, consumed) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.method, "ping");
        assert_eq!(msg.seq_id, 5);
        assert_eq!(field_value(&msg, 1), &Value::I32(-42));
        assert_eq!(field_value(&msg, 2), &Value::Bool(true));
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn compact_nested_containers_restore_state() {
        let mut data = vec![0x82, 0x21];
        data.extend_from_slice(&varint(1));
        data.extend_from_slice(&varint(1));
        data.push(b'm');
        // Field 1: list<list<i32>> [[7]].
        data.push(0x19); // field 1, list
        data.push(0x19); // outer: size 1, element type list
        data.push(0x15); // inner: size 1, element type i32
        data.extend_from_slice(&varint(zig_zag(7)));
        data.push(0x00);

        let (msg, consumed) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(
            field_value(&msg, 1),
            &Value::List(
                FieldType::List,
                vec![Value::List(FieldType::I32, vec![Value::I32(7)])]
            )
        );
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn compact_map_decodes() {
        let mut data = vec![0x82, 0x21];
        data.extend_from_slice(&varint(1));
        data.extend_from_slice(&varint(1));
        data.push(b'm');
        // Field 1: map<i32,str> { 1: "a" }.
        data.push(0x1b);
        data.extend_from_slice(&varint(1)); // size
        data.push(0x58); // key i32 (5), value string (8)
        data.extend_from_slice(&varint(zig_zag(1)));
        data.extend_from_slice(&varint(1));
        data.push(b'a');
        data.push(0x00);

        let (msg, _) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(
            field_value(&msg, 1),
            &Value::Map(
                FieldType::I32,
                FieldType::String,
                vec![(Value::I32(1), Value::Binary(b"a".to_vec()))]
            )
        );
    }

    #[test]
    fn json_call_decodes_end_to_end() {
        let data = br#"[1,"ping",1,0,{"1":{"i32":42},"2":{"str":"hi"}}]"#;
        assert_eq!(detect(data), Some(ProtocolVariant::Json));
        let (msg, consumed) = decode_message(data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.method, "ping");
        assert_eq!(msg.kind, MessageKind::Call);
        assert_eq!(msg.seq_id, 0);
        assert_eq!(field_value(&msg, 1), &Value::I32(42));
        assert_eq!(field_value(&msg, 2), &Value::Binary(b"hi".to_vec()));
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn json_nested_struct_and_list() {
        let data =
            br#"[1,"m",2,1,{"1":{"rec":{"5":{"lst":["i64",2,10,20]}}},"2":{"dbl":1.5}}]"#;
        let (msg, consumed) = decode_message(data, &DecodeOptions::default()).unwrap();
        match field_value(&msg, 1) {
            Value::Struct(inner) => {
                assert_eq!(inner.fields[0].id, 5);
                assert_eq!(
                    inner.fields[0].value,
                    Some(Value::List(
                        FieldType::I64,
                        vec![Value::I64(10), Value::I64(20)]
                    ))
                );
            }
            other => panic!("expected struct, got {other:?}"),
        }
        assert_eq!(field_value(&msg, 2), &Value::Double(1.5));
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn json_map_with_quoted_keys() {
        let data = br#"[1,"m",1,0,{"1":{"map":["i32","str",2,{"1":"a","2":"b"}]}}]"#;
        let (msg, _) = decode_message(data, &DecodeOptions::default()).unwrap();
        assert_eq!(
            field_value(&msg, 1),
            &Value::Map(
                FieldType::I32,
                FieldType::String,
                vec![
                    (Value::I32(1), Value::Binary(b"a".to_vec())),
                    (Value::I32(2), Value::Binary(b"b".to_vec())),
                ]
            )
        );
    }

    #[test]
    fn json_escaped_method_name_rejected_for_spaces() {
        let data = br#"[1," ping",1,0,{}]"#;
        assert_eq!(
            decode_message(data, &DecodeOptions::default()),
            Err(DecodeError::InvalidMethodName)
        );
    }

    #[test]
    fn skip_mode_across_protocols() {
        let data = br#"[1,"ping",1,0,{"1":{"i32":42},"2":{"lst":["i32",1,5]}}]"#;
        let options = DecodeOptions {
            read_values: false,
            ..DecodeOptions::default()
        };
        let (msg, consumed) = decode_message(data, &options).unwrap();
        assert_eq!(msg.body.fields[0].value, None);
        assert_eq!(
            msg.body.fields[1].value,
            Some(Value::List(FieldType::I32, Vec::new()))
        );
        assert_eq!(consumed as usize, data.len());
    }

    #[test]
    fn depth_limit_applies_through_options() {
        let mut data = vec![0x80, 0x01, 0x00, 0x01];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(b'm');
        data.extend_from_slice(&0u32.to_be_bytes());
        for _ in 0..8 {
            data.extend_from_slice(&[0x0c, 0x00, 0x01]); // struct field 1
        }
        for _ in 0..9 {
            data.push(0x00);
        }
        let options = DecodeOptions {
            limits: DecodeLimits {
                max_depth: 4,
                ..DecodeLimits::default()
            },
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_message(&data, &options),
            Err(DecodeError::DepthLimitExceeded(4))
        );
        // The default limit of 64 is plenty for eight levels.
        assert!(decode_message(&data, &DecodeOptions::default()).is_ok());
    }

    #[test]
    fn unknown_message_kind_is_kept() {
        let mut data = vec![0x80, 0x01, 0x00, 0x09]; // kind byte 9
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(b'm');
        data.extend_from_slice(&0u32.to_be_bytes());
        data.push(0x00);
        let (msg, _) = decode_message(&data, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown);
    }

    #[test]
    fn message_renders_to_json() {
        let data = br#"[1,"ping",1,3,{"1":{"i32":42}}]"#;
        let (msg, _) = decode_message(data, &DecodeOptions::default()).unwrap();
        let json = msg.to_json();
        assert_eq!(json["method"], serde_json::json!("ping"));
        assert_eq!(json["type"], serde_json::json!("call"));
        assert_eq!(json["seqid"], serde_json::json!(3));
        assert_eq!(json["args"]["fields"][0]["field_id"], serde_json::json!(1));
        assert_eq!(json["args"]["fields"][0]["value"], serde_json::json!(42));
    }

    #[test]
    fn truncated_binary_body_reports_offset() {
        let mut data = vec![0x80, 0x01, 0x00, 0x01];
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(b"ping");
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0x08, 0x00, 0x01, 0x00, 0x00]); // i32 cut short
        let err = decode_message(&data, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::Truncated(data.len()));
    }
}
