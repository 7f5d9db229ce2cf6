//! Message encoder

use crate::error::WireError;
use crate::value::{Field, Message, Value, WireVersion};
use crate::{TYPE_INT, TYPE_OBJECT, TYPE_STRING};

/// Encode a message into its framed byte representation.
pub fn encode(msg: &Message) -> Result<Vec<u8>, WireError> {
    let version = msg.version;
    if msg.fields.len() > 255 {
        return Err(WireError::TooManyFields(msg.fields.len()));
    }

    let mut body = Vec::new();
    for field in &msg.fields {
        encode_field(&mut body, version, field)?;
    }

    let total = version.header_len() + body.len();
    if total > version.max_total() {
        return Err(WireError::MessageTooLarge {
            total,
            max: version.max_total(),
        });
    }

    let mut out = Vec::with_capacity(total);
    out.push(version.byte());
    out.push(msg.fields.len() as u8);
    match version {
        WireVersion::V1 => out.extend_from_slice(&(total as u16).to_be_bytes()),
        WireVersion::V2 => out.extend_from_slice(&(total as u32).to_be_bytes()),
    }
    out.extend_from_slice(&body);
    Ok(out)
}

fn encode_field(out: &mut Vec<u8>, version: WireVersion, field: &Field) -> Result<(), WireError> {
    let name = field.name.as_bytes();
    if name.is_empty() || name.len() > 255 {
        return Err(WireError::BadFieldName);
    }
    out.push(name.len() as u8);
    out.extend_from_slice(name);
    out.push(field.value.type_code());
    encode_value(out, version, &field.value)
}

fn encode_value(out: &mut Vec<u8>, version: WireVersion, value: &Value) -> Result<(), WireError> {
    match value {
        Value::Int(i) => {
            out.extend_from_slice(&i.to_be_bytes());
            Ok(())
        }
        Value::Str(s) => {
            write_len(out, version, s.len())?;
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        Value::List(items) => {
            let element_type = list_element_type(items)?;
            out.push(element_type);
            write_len(out, version, items.len())?;
            for item in items {
                if item.type_code() != element_type {
                    return Err(WireError::MixedList);
                }
                encode_value(out, version, item)?;
            }
            Ok(())
        }
        Value::Object(fields) => {
            if fields.len() > 255 {
                return Err(WireError::TooManyFields(fields.len()));
            }
            out.push(fields.len() as u8);
            for field in fields {
                encode_field(out, version, field)?;
            }
            Ok(())
        }
        Value::Bytes(b) => {
            if version == WireVersion::V1 {
                return Err(WireError::BytesRequiresV2);
            }
            if b.len() > u32::MAX as usize {
                return Err(WireError::ValueTooLarge {
                    len: b.len(),
                    max: u32::MAX as usize,
                });
            }
            out.extend_from_slice(&(b.len() as u32).to_be_bytes());
            out.extend_from_slice(b);
            Ok(())
        }
    }
}

/// Element type of a uniform list. Empty lists carry the int type code.
fn list_element_type(items: &[Value]) -> Result<u8, WireError> {
    let code = items.first().map(Value::type_code).unwrap_or(TYPE_INT);
    match code {
        TYPE_INT | TYPE_STRING | TYPE_OBJECT => Ok(code),
        other => Err(WireError::UnsupportedListElement(other)),
    }
}

/// String and list length fields: 2 bytes under v1, 4 bytes under v2.
fn write_len(out: &mut Vec<u8>, version: WireVersion, len: usize) -> Result<(), WireError> {
    if len > version.max_value_len() {
        return Err(WireError::ValueTooLarge {
            len,
            max: version.max_value_len(),
        });
    }
    match version {
        WireVersion::V1 => out.extend_from_slice(&(len as u16).to_be_bytes()),
        WireVersion::V2 => out.extend_from_slice(&(len as u32).to_be_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout_v1() {
        let msg = Message::new(WireVersion::V1).with("n", Value::Int(1));
        let bytes = encode(&msg).unwrap();

        assert_eq!(bytes[0], 1, "version byte");
        assert_eq!(bytes[1], 1, "field count");
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn test_header_layout_v2() {
        let msg = Message::v2().with("n", Value::Int(1));
        let bytes = encode(&msg).unwrap();

        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[1], 1);
        let declared = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize;
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn test_int_is_big_endian() {
        let msg = Message::v2().with("n", Value::Int(0x0102_0304_0506_0708));
        let bytes = encode(&msg).unwrap();
        // header (6) + name_len (1) + name (1) + type (1) = 9 bytes before the value
        assert_eq!(&bytes[9..17], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_rejects_empty_field_name() {
        let msg = Message::v2().with("", Value::Int(1));
        assert_eq!(encode(&msg), Err(WireError::BadFieldName));
    }

    #[test]
    fn test_rejects_overlong_field_name() {
        let msg = Message::v2().with("x".repeat(256), Value::Int(1));
        assert_eq!(encode(&msg), Err(WireError::BadFieldName));
    }

    #[test]
    fn test_rejects_bytes_under_v1() {
        let msg = Message::new(WireVersion::V1).with("b", Value::Bytes(vec![1]));
        assert_eq!(encode(&msg), Err(WireError::BytesRequiresV2));
    }

    #[test]
    fn test_rejects_mixed_list() {
        let msg = Message::v2().with(
            "items",
            Value::List(vec![Value::Int(1), Value::Str("x".to_string())]),
        );
        assert_eq!(encode(&msg), Err(WireError::MixedList));
    }

    #[test]
    fn test_rejects_list_of_lists() {
        let msg = Message::v2().with("items", Value::List(vec![Value::List(vec![])]));
        assert!(matches!(
            encode(&msg),
            Err(WireError::UnsupportedListElement(_))
        ));
    }

    #[test]
    fn test_rejects_v1_oversize_string() {
        let msg =
            Message::new(WireVersion::V1).with("s", Value::Str("y".repeat(70_000)));
        assert!(matches!(encode(&msg), Err(WireError::ValueTooLarge { .. })));
    }

    #[test]
    fn test_rejects_v1_oversize_total() {
        // Each string fits the u16 value cap but the total frame does not.
        let msg = Message::new(WireVersion::V1)
            .with("a", Value::Str("y".repeat(40_000)))
            .with("b", Value::Str("y".repeat(40_000)));
        assert!(matches!(encode(&msg), Err(WireError::MessageTooLarge { .. })));
    }

    #[test]
    fn test_v2_accepts_what_v1_rejects() {
        let msg = Message::v2().with("s", Value::Str("y".repeat(70_000)));
        assert!(encode(&msg).is_ok());
    }
}
