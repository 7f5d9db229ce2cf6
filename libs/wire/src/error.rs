//! Codec error taxonomy

use thiserror::Error;

/// Failure while encoding or decoding a framed message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown wire version {0}")]
    UnknownVersion(u8),

    #[error("unknown type code 0x{0:02x}")]
    UnknownType(u8),

    #[error("declared length {declared} does not match buffer length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("trailing bytes after declared message end at offset {at}")]
    TrailingBytes { at: usize },

    #[error("message truncated at offset {at}")]
    Truncated { at: usize },

    #[error("field name must be 1..=255 bytes")]
    BadFieldName,

    #[error("invalid UTF-8 in name or string value")]
    InvalidUtf8,

    #[error("message length {total} exceeds the {max}-byte cap for this version")]
    MessageTooLarge { total: usize, max: usize },

    #[error("value length {len} exceeds the {max}-byte cap for this version")]
    ValueTooLarge { len: usize, max: usize },

    #[error("list elements must all share the declared element type")]
    MixedList,

    #[error("list element type 0x{0:02x} is not int, string, or object")]
    UnsupportedListElement(u8),

    #[error("bytes values require wire version 2")]
    BytesRequiresV2,

    #[error("too many fields in message or object: {0} (max 255)")]
    TooManyFields(usize),
}
