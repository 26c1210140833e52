use std::fmt;

use thiserror::Error;

/// Location of a schema field: a top-level field number, optionally inside
/// a nested message.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::FieldPath;
///
/// assert_eq!(FieldPath::top(2).to_string(), "2");
/// assert_eq!(FieldPath::nested(7, 12).to_string(), "7.12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub parent: Option<u8>,
    pub field: u8,
}

impl FieldPath {
    pub const fn top(field: u8) -> Self {
        Self {
            parent: None,
            field,
        }
    }

    pub const fn nested(parent: u8, field: u8) -> Self {
        Self {
            parent: Some(parent),
            field,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}.{}", parent, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

/// Errors returned while decoding a telemetry payload.
///
/// Offsets are byte positions in the top-level payload, including for
/// failures raised inside nested messages.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::ZwiftError;
///
/// let err = ZwiftError::TruncatedMessage { offset: 4, needed: 2, actual: 1 };
/// assert!(err.to_string().contains("truncated message"));
/// assert_eq!(err.id(), "ZM-TRUNCATED-MESSAGE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZwiftError {
    #[error("malformed varint at offset {offset}: input ended after {consumed} continuation bytes")]
    MalformedVarint { offset: usize, consumed: usize },
    #[error("varint overflow at offset {offset}: value exceeds 64 bits ({max_groups} groups max)")]
    VarintOverflow { offset: usize, max_groups: usize },
    #[error("unsupported wire type {wire_type} for field {field} at offset {offset}")]
    UnsupportedWireType {
        field: u8,
        wire_type: u8,
        offset: usize,
    },
    #[error("field number out of range at offset {offset}: tag byte {tag:#04x} needs a multi-byte tag")]
    FieldNumberOutOfRange { offset: usize, tag: u8 },
    #[error("truncated message at offset {offset}: need {needed} bytes, got {actual}")]
    TruncatedMessage {
        offset: usize,
        needed: usize,
        actual: usize,
    },
    #[error("schema mismatch at field {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: FieldPath,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid hex input: {reason}")]
    InvalidHexInput { reason: String },
}

impl ZwiftError {
    /// Stable identifier used to group failures in reports.
    pub fn id(&self) -> &'static str {
        match self {
            ZwiftError::MalformedVarint { .. } => "ZM-MALFORMED-VARINT",
            ZwiftError::VarintOverflow { .. } => "ZM-VARINT-OVERFLOW",
            ZwiftError::UnsupportedWireType { .. } => "ZM-UNSUPPORTED-WIRE-TYPE",
            ZwiftError::FieldNumberOutOfRange { .. } => "ZM-FIELD-NUMBER-RANGE",
            ZwiftError::TruncatedMessage { .. } => "ZM-TRUNCATED-MESSAGE",
            ZwiftError::SchemaMismatch { .. } => "ZM-SCHEMA-MISMATCH",
            ZwiftError::InvalidHexInput { .. } => "ZM-INVALID-HEX",
        }
    }
}
