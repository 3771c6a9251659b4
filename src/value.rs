//! Decoded value tree: [`Value`], [`Field`], [`StructValue`], [`Message`].

use crate::field_type::FieldType;

/// A decoded Thrift value.
///
/// Containers keep the element order in which values appeared on the
/// wire; without a schema a map key can be any type, so maps are kept
/// as pair sequences rather than a keyed collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    /// String and binary fields both land here: with no schema there is
    /// no way to know whether the payload is text.
    Binary(Vec<u8>),
    Struct(StructValue),
    List(FieldType, Vec<Value>),
    Map(FieldType, FieldType, Vec<(Value, Value)>),
    Set(FieldType, Vec<Value>),
}

/// One struct field: wire type, numeric id and (unless the decode ran
/// in skip mode) the decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ftype: FieldType,
    pub id: i16,
    /// `None` when values were skipped. Container fields keep an empty
    /// shell and struct fields always recurse, so a skip-mode scan
    /// still yields the full field/type/id structure.
    pub value: Option<Value>,
}

/// A decoded struct: its fields in wire order plus the exact number of
/// bytes the struct occupied, terminator included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    pub fields: Vec<Field>,
    pub byte_length: u32,
}

/// Message kind from the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Call,
    Reply,
    Exception,
    Oneway,
    /// Anything else on the wire. Kept rather than rejected: a sniffer
    /// should still surface messages with exotic kind bytes.
    Unknown,
}

impl MessageKind {
    pub fn from_wire(kind: i32) -> MessageKind {
        match kind {
            1 => MessageKind::Call,
            2 => MessageKind::Reply,
            3 => MessageKind::Exception,
            4 => MessageKind::Oneway,
            _ => MessageKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Call => "call",
            MessageKind::Reply => "reply",
            MessageKind::Exception => "exception",
            MessageKind::Oneway => "oneway",
            MessageKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded message: envelope, argument struct, optional
/// finagle request header, and total encoded length in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub method: String,
    pub kind: MessageKind,
    pub seq_id: i32,
    pub body: StructValue,
    pub header: Option<StructValue>,
    pub byte_length: u32,
}

impl Message {
    /// Presentation-side JSON rendering of the whole message.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "method": self.method,
            "type": self.kind.as_str(),
            "seqid": self.seq_id,
            "header": self.header.as_ref().map(struct_to_json),
            "args": struct_to_json(&self.body),
            "length": self.byte_length,
        })
    }
}

fn struct_to_json(s: &StructValue) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = s
        .fields
        .iter()
        .map(|f| {
            serde_json::json!({
                "field_type": f.ftype.as_str(),
                "field_id": f.id,
                "value": f.value.as_ref().map(serde_json::Value::from),
            })
        })
        .collect();
    serde_json::json!({ "fields": fields, "length": s.byte_length })
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Byte(n) => serde_json::json!(n),
            Value::I16(n) => serde_json::json!(n),
            Value::I32(n) => serde_json::json!(n),
            Value::I64(n) => serde_json::json!(n),
            Value::Double(d) => serde_json::json!(d),
            Value::Binary(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Value::Struct(s) => struct_to_json(s),
            Value::List(_, items) | Value::Set(_, items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(_, _, pairs) => serde_json::Value::Array(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        serde_json::json!({
                            "key": serde_json::Value::from(k),
                            "value": serde_json::Value::from(v),
                        })
                    })
                    .collect(),
            ),
        }
    }
}
