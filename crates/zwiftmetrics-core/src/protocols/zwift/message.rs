use std::collections::BTreeMap;

use serde::Serialize;

use super::error::ZwiftError;
use super::reader::{WireReader, WireType};

/// Value recorded for one field of a decoded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Integer(i64),
    Nested(DecodedMessage),
}

impl DecodedValue {
    pub fn shape(&self) -> &'static str {
        match self {
            DecodedValue::Integer(_) => "integer",
            DecodedValue::Nested(_) => "nested message",
        }
    }
}

/// Generic field-number to value mapping produced without a schema.
///
/// The first occurrence of a field number wins; later duplicates are
/// dropped by [`DecodedMessage::insert_first`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecodedMessage {
    fields: BTreeMap<u8, DecodedValue>,
}

impl DecodedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `field` unless the field is already present.
    /// Returns `false` when the value was discarded as a duplicate.
    pub fn insert_first(&mut self, field: u8, value: DecodedValue) -> bool {
        if self.fields.contains_key(&field) {
            return false;
        }
        self.fields.insert(field, value);
        true
    }

    pub fn get(&self, field: u8) -> Option<&DecodedValue> {
        self.fields.get(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &DecodedValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }
}

impl FromIterator<(u8, DecodedValue)> for DecodedMessage {
    fn from_iter<I: IntoIterator<Item = (u8, DecodedValue)>>(iter: I) -> Self {
        let mut message = DecodedMessage::new();
        for (field, value) in iter {
            message.insert_first(field, value);
        }
        message
    }
}

/// Decode one message body into a generic field mapping.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::{DecodedValue, decode_message};
///
/// let message = decode_message(&[0x08, 0x02, 0x3a, 0x02, 0x60, 0x5a]).unwrap();
/// assert_eq!(message.get(1), Some(&DecodedValue::Integer(2)));
/// let DecodedValue::Nested(state) = message.get(7).unwrap() else {
///     panic!("expected nested player state");
/// };
/// assert_eq!(state.get(12), Some(&DecodedValue::Integer(90)));
/// ```
///
/// # Errors
/// Fails on unsupported wire types, multi-byte tags and any read past the
/// end of the body. No partial message is returned.
pub fn decode_message(payload: &[u8]) -> Result<DecodedMessage, ZwiftError> {
    decode_body(WireReader::new(payload))
}

// Recursion depth is bounded by the single-byte body length: each level
// spends at least a tag byte and a length byte of its parent's 255.
fn decode_body(mut reader: WireReader<'_>) -> Result<DecodedMessage, ZwiftError> {
    let mut message = DecodedMessage::new();
    while !reader.is_at_end() {
        let tag_offset = reader.offset();
        let tag = reader.read_tag()?;
        let value = match tag.wire_type {
            WireType::Varint => DecodedValue::Integer(reader.read_varint()? as i64),
            WireType::LengthDelimited => {
                let len = reader.read_u8()? as usize;
                let body_offset = reader.offset();
                let body = reader.read_slice(len)?;
                DecodedValue::Nested(decode_body(WireReader::at(body, body_offset))?)
            }
            WireType::Unsupported(wire_type) => {
                return Err(ZwiftError::UnsupportedWireType {
                    field: tag.field,
                    wire_type,
                    offset: tag_offset,
                });
            }
        };
        if !message.insert_first(tag.field, value) {
            tracing::trace!(field = tag.field, offset = tag_offset, "duplicate field ignored");
        }
    }
    Ok(message)
}
