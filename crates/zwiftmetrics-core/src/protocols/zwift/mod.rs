//! Zwift outgoing player-state decoding.
//!
//! Payloads look like protobuf but are walked by a purpose-built decoder:
//! tags are a single byte (field numbers 0..=15), only varint and
//! length-delimited wire types exist, and a nested body length is one
//! unsigned byte rather than a varint. Anything outside that contract is
//! rejected with an explicit error instead of being guessed at.
//!
//! `reader` holds the byte-level conventions (tag split, varints, bounded
//! cursor), `message` the schema-less field walk, `parser` the fixed
//! telemetry schema, and `hex_input` the hex text entry point.

pub mod error;
pub mod hex_input;
pub mod layout;
pub mod message;
pub mod parser;
pub mod reader;

pub use error::{FieldPath, ZwiftError};
pub use hex_input::{decode_hex, parse_telemetry_hex};
pub use layout::ZWIFT_OUTGOING_PORT;
pub use message::{DecodedMessage, DecodedValue, decode_message};
pub use parser::{TelemetryPacket, map_telemetry, parse_telemetry};
pub use reader::read_varint;
