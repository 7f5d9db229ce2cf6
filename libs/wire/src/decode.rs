//! Message decoder
//!
//! Strict by construction: the declared total length must equal the
//! buffer length, every read is bounds-checked, and any bytes left over
//! after the declared field count is an error.

use crate::error::WireError;
use crate::value::{Field, Message, Value, WireVersion};
use crate::{TYPE_BYTES, TYPE_INT, TYPE_LIST, TYPE_OBJECT, TYPE_STRING};

/// Decode one framed message. Accepts both wire versions.
pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
    let mut cur = Cursor { buf, pos: 0 };

    let version_byte = cur.u8()?;
    let version =
        WireVersion::from_byte(version_byte).ok_or(WireError::UnknownVersion(version_byte))?;
    let field_count = cur.u8()?;
    let declared = cur.read_len(version)?;
    if declared != buf.len() {
        return Err(WireError::LengthMismatch {
            declared,
            actual: buf.len(),
        });
    }

    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(decode_field(&mut cur, version)?);
    }

    if cur.pos != buf.len() {
        return Err(WireError::TrailingBytes { at: cur.pos });
    }

    Ok(Message { version, fields })
}

fn decode_field(cur: &mut Cursor<'_>, version: WireVersion) -> Result<Field, WireError> {
    let name_len = cur.u8()?;
    if name_len == 0 {
        return Err(WireError::BadFieldName);
    }
    let name = std::str::from_utf8(cur.take(name_len as usize)?)
        .map_err(|_| WireError::InvalidUtf8)?
        .to_string();
    let type_code = cur.u8()?;
    let value = decode_value(cur, version, type_code)?;
    Ok(Field { name, value })
}

fn decode_value(
    cur: &mut Cursor<'_>,
    version: WireVersion,
    type_code: u8,
) -> Result<Value, WireError> {
    match type_code {
        TYPE_INT => {
            let raw: [u8; 8] = cur.take(8)?.try_into().expect("8-byte slice");
            Ok(Value::Int(i64::from_be_bytes(raw)))
        }
        TYPE_STRING => {
            let len = cur.read_len(version)?;
            let s = std::str::from_utf8(cur.take(len)?)
                .map_err(|_| WireError::InvalidUtf8)?
                .to_string();
            Ok(Value::Str(s))
        }
        TYPE_LIST => {
            let element_type = cur.u8()?;
            if !matches!(element_type, TYPE_INT | TYPE_STRING | TYPE_OBJECT) {
                return Err(WireError::UnsupportedListElement(element_type));
            }
            let count = cur.read_len(version)?;
            // A hostile count cannot force a huge allocation up front.
            let mut items = Vec::with_capacity(count.min(cur.remaining()));
            for _ in 0..count {
                items.push(decode_value(cur, version, element_type)?);
            }
            Ok(Value::List(items))
        }
        TYPE_OBJECT => {
            let field_count = cur.u8()?;
            let mut fields = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                fields.push(decode_field(cur, version)?);
            }
            Ok(Value::Object(fields))
        }
        TYPE_BYTES => {
            if version == WireVersion::V1 {
                return Err(WireError::BytesRequiresV2);
            }
            let raw: [u8; 4] = cur.take(4)?.try_into().expect("4-byte slice");
            let len = u32::from_be_bytes(raw) as usize;
            Ok(Value::Bytes(cur.take(len)?.to_vec()))
        }
        other => Err(WireError::UnknownType(other)),
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.remaining() {
            return Err(WireError::Truncated { at: self.pos });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    /// Length field: 2 bytes under v1, 4 bytes under v2.
    fn read_len(&mut self, version: WireVersion) -> Result<usize, WireError> {
        match version {
            WireVersion::V1 => {
                let raw: [u8; 2] = self.take(2)?.try_into().expect("2-byte slice");
                Ok(u16::from_be_bytes(raw) as usize)
            }
            WireVersion::V2 => {
                let raw: [u8; 4] = self.take(4)?.try_into().expect("4-byte slice");
                Ok(u32::from_be_bytes(raw) as usize)
            }
        }
    }
}
