use super::error::ZwiftError;
use super::layout;

/// Wire encoding announced by a tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    LengthDelimited,
    Unsupported(u8),
}

impl WireType {
    pub fn from_code(code: u8) -> Self {
        match code {
            layout::WIRE_TYPE_VARINT => WireType::Varint,
            layout::WIRE_TYPE_LENGTH_DELIMITED => WireType::LengthDelimited,
            other => WireType::Unsupported(other),
        }
    }
}

/// Field number and wire type packed into a single tag byte.
///
/// Only single-byte tags are accepted, which bounds field numbers to 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field: u8,
    pub wire_type: WireType,
}

impl Tag {
    /// Split a tag byte located at `offset` into field number and wire type.
    ///
    /// # Examples
    /// ```text
    /// use zwiftmetrics_core::protocols::zwift::reader::{Tag, WireType};
    ///
    /// let tag = Tag::from_byte(0x3a, 0).unwrap();
    /// assert_eq!(tag.field, 7);
    /// assert_eq!(tag.wire_type, WireType::LengthDelimited);
    /// ```
    pub fn from_byte(byte: u8, offset: usize) -> Result<Self, ZwiftError> {
        if byte & layout::TAG_CONTINUATION_BIT != 0 {
            return Err(ZwiftError::FieldNumberOutOfRange { offset, tag: byte });
        }
        Ok(Self {
            field: (byte >> layout::TAG_FIELD_SHIFT) & layout::TAG_FIELD_MASK,
            wire_type: WireType::from_code(byte & layout::TAG_WIRE_TYPE_MASK),
        })
    }
}

/// Decode one varint from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed. Error offsets are
/// relative to `bytes`.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::read_varint;
///
/// assert_eq!(read_varint(&[0x96, 0x01]).unwrap(), (150, 2));
/// assert_eq!(read_varint(&[0x05, 0xff]).unwrap(), (5, 1));
/// ```
///
/// # Errors
/// `MalformedVarint` when the input ends on a continuation byte,
/// `VarintOverflow` when the value does not fit in 64 bits.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize), ZwiftError> {
    let overflow = ZwiftError::VarintOverflow {
        offset: 0,
        max_groups: layout::VARINT_MAX_GROUPS,
    };
    let mut value = 0u64;
    for (index, byte) in bytes.iter().copied().enumerate() {
        if index == layout::VARINT_MAX_GROUPS {
            return Err(overflow);
        }
        let payload_bits = byte & layout::VARINT_GROUP_MASK;
        if index == layout::VARINT_MAX_GROUPS - 1 && payload_bits > layout::VARINT_LAST_GROUP_MAX {
            return Err(overflow);
        }
        let group = u64::from(payload_bits);
        value |= group << (layout::VARINT_GROUP_BITS * index as u32);
        if byte & layout::VARINT_CONTINUATION_BIT == 0 {
            return Ok((value, index + 1));
        }
    }
    Err(ZwiftError::MalformedVarint {
        offset: 0,
        consumed: bytes.len(),
    })
}

/// Forward-only cursor over one message body.
///
/// `base` is the absolute position of the body inside the top-level
/// payload so nested failures still report payload offsets.
pub struct WireReader<'a> {
    payload: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self::at(payload, 0)
    }

    pub fn at(payload: &'a [u8], base: usize) -> Self {
        Self {
            payload,
            base,
            pos: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.payload.len()
    }

    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    fn truncated(&self, needed: usize) -> ZwiftError {
        ZwiftError::TruncatedMessage {
            offset: self.offset(),
            needed,
            actual: self.remaining(),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ZwiftError> {
        let byte = self
            .payload
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.truncated(1))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ZwiftError> {
        let end = self.pos + len;
        let bytes = self
            .payload
            .get(self.pos..end)
            .ok_or_else(|| self.truncated(len))?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_tag(&mut self) -> Result<Tag, ZwiftError> {
        let offset = self.offset();
        let byte = self.read_u8()?;
        Tag::from_byte(byte, offset)
    }

    /// Read a varint at the cursor. A varint cut off by the end of the body
    /// is reported as a truncated message.
    pub fn read_varint(&mut self) -> Result<u64, ZwiftError> {
        let offset = self.offset();
        match read_varint(&self.payload[self.pos..]) {
            Ok((value, consumed)) => {
                self.pos += consumed;
                Ok(value)
            }
            Err(ZwiftError::MalformedVarint { consumed, .. }) => Err(ZwiftError::TruncatedMessage {
                offset,
                needed: consumed + 1,
                actual: consumed,
            }),
            Err(ZwiftError::VarintOverflow { max_groups, .. }) => {
                Err(ZwiftError::VarintOverflow { offset, max_groups })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Tag, WireReader, WireType, read_varint};
    use crate::protocols::zwift::error::ZwiftError;

    #[test]
    fn varint_single_byte() {
        assert_eq!(read_varint(&[0x00]).unwrap(), (0, 1));
        assert_eq!(read_varint(&[0x7f]).unwrap(), (127, 1));
    }

    #[test]
    fn varint_multi_byte_little_endian_groups() {
        assert_eq!(read_varint(&[0xac, 0x02]).unwrap(), (300, 2));
        assert_eq!(read_varint(&[0xb9, 0x60]).unwrap(), (12345, 2));
    }

    #[test]
    fn varint_max_u64() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert_eq!(read_varint(&bytes).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn varint_tenth_group_beyond_bit_63_overflows() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f];
        let err = read_varint(&bytes).unwrap_err();
        assert_eq!(
            err,
            ZwiftError::VarintOverflow {
                offset: 0,
                max_groups: 10
            }
        );

        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x02];
        assert!(read_varint(&bytes).is_err());
    }

    #[test]
    fn varint_ends_on_continuation() {
        let err = read_varint(&[0x80, 0x80]).unwrap_err();
        assert_eq!(
            err,
            ZwiftError::MalformedVarint {
                offset: 0,
                consumed: 2
            }
        );
    }

    #[test]
    fn varint_empty_input_is_malformed() {
        let err = read_varint(&[]).unwrap_err();
        assert!(matches!(err, ZwiftError::MalformedVarint { consumed: 0, .. }));
    }

    #[test]
    fn varint_more_than_ten_groups_overflows() {
        let bytes = [0x80u8; 11];
        let err = read_varint(&bytes).unwrap_err();
        assert!(matches!(err, ZwiftError::VarintOverflow { max_groups: 10, .. }));
    }

    #[test]
    fn tag_splits_field_and_wire_type() {
        let tag = Tag::from_byte(0x3a, 0).unwrap();
        assert_eq!(tag.field, 7);
        assert_eq!(tag.wire_type, WireType::LengthDelimited);

        let tag = Tag::from_byte(0x78, 0).unwrap();
        assert_eq!(tag.field, 15);
        assert_eq!(tag.wire_type, WireType::Varint);

        let tag = Tag::from_byte(0x0d, 0).unwrap();
        assert_eq!(tag.wire_type, WireType::Unsupported(5));
    }

    #[test]
    fn tag_with_continuation_bit_is_rejected() {
        let err = Tag::from_byte(0x80, 3).unwrap_err();
        assert_eq!(
            err,
            ZwiftError::FieldNumberOutOfRange {
                offset: 3,
                tag: 0x80
            }
        );
    }

    #[test]
    fn reader_reports_absolute_offsets() {
        let body = [0x96];
        let mut reader = WireReader::at(&body, 10);
        let err = reader.read_varint().unwrap_err();
        assert_eq!(
            err,
            ZwiftError::TruncatedMessage {
                offset: 10,
                needed: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn read_slice_past_end_is_truncated() {
        let body = [1, 2, 3];
        let mut reader = WireReader::new(&body);
        reader.read_u8().unwrap();
        let err = reader.read_slice(4).unwrap_err();
        assert_eq!(
            err,
            ZwiftError::TruncatedMessage {
                offset: 1,
                needed: 4,
                actual: 2
            }
        );
        assert_eq!(reader.offset(), 1);
    }
}
