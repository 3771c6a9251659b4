//! Wire format sniffing.

use crate::protocol::binary;
use crate::protocol::ProtocolVariant;

/// Guesses the wire format from the leading bytes of a message.
///
/// Compact starts with its protocol id `0x82`; versioned binary starts
/// with a negative big-endian word carrying the version magic; JSON
/// starts with `[1` (the array opener and version). Legacy unversioned
/// binary has no signature and comes back `None`, so callers fall back
/// to their configured default.
pub fn detect(data: &[u8]) -> Option<ProtocolVariant> {
    if data.first() == Some(&0x82) {
        return Some(ProtocolVariant::Compact);
    }
    if data.len() >= 4 {
        let word = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if word < 0 && word & binary::VERSION_MASK == binary::VERSION_1 {
            return Some(ProtocolVariant::Binary);
        }
    }
    if data.starts_with(b"[1") {
        return Some(ProtocolVariant::Json);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_compact() {
        assert_eq!(detect(&[0x82, 0x21]), Some(ProtocolVariant::Compact));
    }

    #[test]
    fn detects_versioned_binary() {
        assert_eq!(
            detect(&[0x80, 0x01, 0x00, 0x01]),
            Some(ProtocolVariant::Binary)
        );
    }

    #[test]
    fn detects_json() {
        assert_eq!(detect(b"[1,\"ping\""), Some(ProtocolVariant::Json));
    }

    #[test]
    fn legacy_binary_is_unrecognized() {
        // Unversioned binary opens with the method name length.
        assert_eq!(detect(&[0x00, 0x00, 0x00, 0x04]), None);
        assert_eq!(detect(&[]), None);
    }
}
