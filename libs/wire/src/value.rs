//! Message, field, and value model
//!
//! Field order is preserved exactly as encoded so that
//! `decode(encode(m)) == m` holds structurally, not just semantically.

use crate::{TYPE_BYTES, TYPE_INT, TYPE_LIST, TYPE_OBJECT, TYPE_STRING};

/// Wire format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVersion {
    V1,
    V2,
}

impl WireVersion {
    pub fn byte(self) -> u8 {
        match self {
            WireVersion::V1 => 1,
            WireVersion::V2 => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(WireVersion::V1),
            2 => Some(WireVersion::V2),
            _ => None,
        }
    }

    /// Fixed header size: version byte + field count byte + length field.
    pub fn header_len(self) -> usize {
        match self {
            WireVersion::V1 => 4,
            WireVersion::V2 => 6,
        }
    }

    /// Cap on the total message length, header included.
    pub fn max_total(self) -> usize {
        match self {
            WireVersion::V1 => u16::MAX as usize,
            WireVersion::V2 => u32::MAX as usize,
        }
    }

    /// Cap on a single string or list length field.
    pub fn max_value_len(self) -> usize {
        match self {
            WireVersion::V1 => u16::MAX as usize,
            WireVersion::V2 => u32::MAX as usize,
        }
    }
}

/// A decoded or to-be-encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Object(Vec<Field>),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn type_code(&self) -> u8 {
        match self {
            Value::Int(_) => TYPE_INT,
            Value::Str(_) => TYPE_STRING,
            Value::List(_) => TYPE_LIST,
            Value::Object(_) => TYPE_OBJECT,
            Value::Bytes(_) => TYPE_BYTES,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[Field]> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// A named value inside a message or object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Look up a field by name in an object's field list.
pub fn lookup<'a>(fields: &'a [Field], name: &str) -> Option<&'a Value> {
    fields.iter().find(|f| f.name == name).map(|f| &f.value)
}

/// One complete framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: WireVersion,
    pub fields: Vec<Field>,
}

impl Message {
    pub fn new(version: WireVersion) -> Self {
        Self {
            version,
            fields: Vec::new(),
        }
    }

    /// Server responses default to version 2.
    pub fn v2() -> Self {
        Self::new(WireVersion::V2)
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push(Field::new(name, value));
    }

    /// Builder-style variant of [`push`](Self::push).
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        lookup(&self.fields, name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn get_object(&self, name: &str) -> Option<&[Field]> {
        self.get(name).and_then(Value::as_object)
    }
}
