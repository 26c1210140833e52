use serde::{Deserialize, Serialize};

use super::error::{FieldPath, ZwiftError};
use super::layout::{self, player_state};
use super::message::{DecodedMessage, DecodedValue, decode_message};

/// Telemetry carried by one outgoing player-state datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub connection_status_id: i32,
    pub zwift_user_id: i32,
    /// World clock of the game; zero when the datagram omits it.
    pub world_timestamp: i64,
    pub distance: i64,
    pub speed: i32,
    pub cadence: i32,
    pub heart_rate: i32,
    pub power: i32,
    pub elevation_gain: i64,
}

/// Decode a raw datagram payload into a telemetry packet.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::parse_telemetry;
///
/// let payload = [
///     0x08, 0x02, 0x10, 0xb9, 0x60, 0x3a, 0x0f, 0x18, 0xe8, 0x07, 0x30, 0x1e, 0x48, 0x5a,
///     0x58, 0x91, 0x01, 0x60, 0xdc, 0x01, 0x78, 0x32,
/// ];
/// let packet = parse_telemetry(&payload).unwrap();
/// assert_eq!(packet.heart_rate, 145);
/// assert_eq!(packet.power, 220);
/// ```
pub fn parse_telemetry(payload: &[u8]) -> Result<TelemetryPacket, ZwiftError> {
    let message = decode_message(payload)?;
    map_telemetry(&message)
}

/// Project a decoded top-level message onto the telemetry schema.
///
/// 64-bit values are truncated to 32 bits for the `i32` targets, matching
/// how the wire format defines `int32` fields.
pub fn map_telemetry(message: &DecodedMessage) -> Result<TelemetryPacket, ZwiftError> {
    let connection_status_id = require_integer(
        message,
        FieldPath::top(layout::FIELD_CONNECTION_STATUS_ID),
    )? as i32;
    let zwift_user_id = require_integer(message, FieldPath::top(layout::FIELD_ZWIFT_USER_ID))? as i32;
    let world_timestamp =
        optional_integer(message, FieldPath::top(layout::FIELD_WORLD_TIMESTAMP))?.unwrap_or(0);

    let state = require_nested(message, FieldPath::top(layout::FIELD_PLAYER_STATE))?;
    let in_state = |field| FieldPath::nested(layout::FIELD_PLAYER_STATE, field);

    Ok(TelemetryPacket {
        connection_status_id,
        zwift_user_id,
        world_timestamp,
        distance: require_integer(state, in_state(player_state::DISTANCE))?,
        speed: require_integer(state, in_state(player_state::SPEED))? as i32,
        cadence: require_integer(state, in_state(player_state::CADENCE))? as i32,
        heart_rate: require_integer(state, in_state(player_state::HEART_RATE))? as i32,
        power: require_integer(state, in_state(player_state::POWER))? as i32,
        elevation_gain: require_integer(state, in_state(player_state::ELEVATION_GAIN))?,
    })
}

fn optional_integer(message: &DecodedMessage, path: FieldPath) -> Result<Option<i64>, ZwiftError> {
    match message.get(path.field) {
        None => Ok(None),
        Some(DecodedValue::Integer(value)) => Ok(Some(*value)),
        Some(other) => Err(mismatch(path, "integer", other.shape())),
    }
}

fn require_integer(message: &DecodedMessage, path: FieldPath) -> Result<i64, ZwiftError> {
    optional_integer(message, path)?.ok_or_else(|| mismatch(path, "integer", "nothing"))
}

fn require_nested(message: &DecodedMessage, path: FieldPath) -> Result<&DecodedMessage, ZwiftError> {
    match message.get(path.field) {
        Some(DecodedValue::Nested(nested)) => Ok(nested),
        Some(other) => Err(mismatch(path, "nested message", other.shape())),
        None => Err(mismatch(path, "nested message", "nothing")),
    }
}

fn mismatch(path: FieldPath, expected: &'static str, found: &'static str) -> ZwiftError {
    ZwiftError::SchemaMismatch {
        path,
        expected,
        found,
    }
}
