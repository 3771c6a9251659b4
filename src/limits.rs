//! Per-call decode limits and options.

use crate::protocol::ProtocolVariant;

/// Bounds on adversarial input, checked before any allocation happens.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    /// Maximum number of fields in a single struct. Bounds inputs that
    /// omit the stop marker.
    pub max_fields: usize,
    pub max_list_size: u32,
    pub max_map_size: u32,
    pub max_set_size: u32,
    /// Maximum struct/container nesting depth.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_fields: 1000,
            max_list_size: 10_000,
            max_map_size: 10_000,
            max_set_size: 10_000,
            max_depth: 64,
        }
    }
}

/// Options for one [`decode_message`](crate::decode_message) call.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Wire format to use. `None` sniffs the buffer's leading bytes and
    /// falls back to [`fallback`](DecodeOptions::fallback).
    pub protocol: Option<ProtocolVariant>,
    pub fallback: ProtocolVariant,
    /// When false, run a structural-only scan: field ids and types are
    /// still collected but scalar values are skipped over.
    pub read_values: bool,
    /// Decode the finagle-thrift request header struct prepended ahead
    /// of the standard envelope.
    pub finagle_header: bool,
    pub limits: DecodeLimits,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            protocol: None,
            fallback: ProtocolVariant::Binary,
            read_values: true,
            finagle_header: false,
            limits: DecodeLimits::default(),
        }
    }
}
