//! Self-describing binary message format ("galacticbuf")
//!
//! Every request and response body on the exchange is one framed message.
//! A message starts with a fixed header: one version byte (1 or 2), one
//! field-count byte, then the total message length including the header
//! (2 bytes big-endian under version 1, 4 bytes under version 2). The
//! body is `field_count` named, typed fields.
//!
//! Each field is `name_length` (1 byte, 1..=255), the UTF-8 name bytes,
//! a type code byte, then the value:
//!
//! | code | type   | encoding                                             |
//! |------|--------|------------------------------------------------------|
//! | 0x01 | int    | signed 64-bit big-endian                             |
//! | 0x02 | string | length (2 bytes v1 / 4 bytes v2) + UTF-8 bytes       |
//! | 0x03 | list   | element-type byte + count (2 v1 / 4 v2) + values     |
//! | 0x04 | object | field-count byte + fields, recursively               |
//! | 0x05 | bytes  | length (always 4 bytes) + raw bytes, version 2 only  |
//!
//! List elements are uniformly typed and restricted to int, string, or
//! object. Both versions decode through the same entry point; the
//! version byte in the header decides the length widths.

mod decode;
mod encode;
mod error;
mod value;

pub use decode::decode;
pub use encode::encode;
pub use error::WireError;
pub use value::{lookup, Field, Message, Value, WireVersion};

/// Type code for signed 64-bit integers.
pub const TYPE_INT: u8 = 0x01;
/// Type code for UTF-8 strings.
pub const TYPE_STRING: u8 = 0x02;
/// Type code for uniformly-typed lists.
pub const TYPE_LIST: u8 = 0x03;
/// Type code for nested objects.
pub const TYPE_OBJECT: u8 = 0x04;
/// Type code for raw byte blobs (version 2 only).
pub const TYPE_BYTES: u8 = 0x05;

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_message(version: WireVersion) -> Message {
        Message::new(version)
            .with("price", Value::Int(-1500))
            .with("owner", Value::Str("alice".to_string()))
            .with(
                "orders",
                Value::List(vec![
                    Value::Object(vec![
                        Field::new("id", Value::Int(1)),
                        Field::new("tag", Value::Str("a".to_string())),
                    ]),
                    Value::Object(vec![
                        Field::new("id", Value::Int(2)),
                        Field::new("tag", Value::Str("b".to_string())),
                    ]),
                ]),
            )
            .with(
                "meta",
                Value::Object(vec![Field::new(
                    "numbers",
                    Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
                )]),
            )
    }

    #[test]
    fn test_roundtrip_v1() {
        let msg = nested_message(WireVersion::V1);
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_roundtrip_v2() {
        let msg = nested_message(WireVersion::V2);
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_v1_and_v2_share_one_decoder() {
        // A v1 frame decodes through the same entry point as a v2 frame.
        let v1 = encode(&Message::new(WireVersion::V1).with("x", Value::Int(7))).unwrap();
        let v2 = encode(&Message::new(WireVersion::V2).with("x", Value::Int(7))).unwrap();

        assert_eq!(decode(&v1).unwrap().version, WireVersion::V1);
        assert_eq!(decode(&v2).unwrap().version, WireVersion::V2);
        assert_eq!(decode(&v1).unwrap().get_int("x"), Some(7));
        assert_eq!(decode(&v2).unwrap().get_int("x"), Some(7));
    }

    #[test]
    fn test_roundtrip_int_extremes() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let msg = Message::new(WireVersion::V2).with("n", Value::Int(value));
            let decoded = decode(&encode(&msg).unwrap()).unwrap();
            assert_eq!(decoded.get_int("n"), Some(value));
        }
    }

    #[test]
    fn test_roundtrip_bytes_v2() {
        let msg = Message::new(WireVersion::V2).with("blob", Value::Bytes(vec![0, 1, 2, 255]));
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_roundtrip_empty_list() {
        let msg = Message::new(WireVersion::V1).with("items", Value::List(vec![]));
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded.get_list("items"), Some(&[][..]));
    }

    #[test]
    fn test_roundtrip_unicode_strings() {
        let msg = Message::new(WireVersion::V2).with("name", Value::Str("åström ⚡".to_string()));
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded.get_str("name"), Some("åström ⚡"));
    }
}
