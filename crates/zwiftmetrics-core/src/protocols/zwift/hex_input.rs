use super::error::ZwiftError;
use super::parser::{TelemetryPacket, parse_telemetry};

/// Convert hex text (two digits per byte, any case) into payload bytes.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::decode_hex;
///
/// assert_eq!(decode_hex("3A0f").unwrap(), vec![0x3a, 0x0f]);
/// assert!(decode_hex("3a0").is_err());
/// ```
pub fn decode_hex(text: &str) -> Result<Vec<u8>, ZwiftError> {
    ::hex::decode(text).map_err(|err| ZwiftError::InvalidHexInput {
        reason: err.to_string(),
    })
}

/// Decode a telemetry packet from a hex-encoded datagram payload.
pub fn parse_telemetry_hex(text: &str) -> Result<TelemetryPacket, ZwiftError> {
    let payload = decode_hex(text)?;
    parse_telemetry(&payload)
}

#[cfg(test)]
mod tests {
    use super::{decode_hex, parse_telemetry_hex};
    use crate::protocols::zwift::error::ZwiftError;

    #[test]
    fn decode_mixed_case() {
        assert_eq!(decode_hex("08021Fab").unwrap(), vec![0x08, 0x02, 0x1f, 0xab]);
    }

    #[test]
    fn empty_text_is_empty_payload() {
        assert!(decode_hex("").unwrap().is_empty());
    }

    #[test]
    fn odd_length_is_rejected() {
        let err = decode_hex("080").unwrap_err();
        assert!(matches!(err, ZwiftError::InvalidHexInput { .. }));
    }

    #[test]
    fn non_hex_character_is_rejected() {
        let err = decode_hex("08zz").unwrap_err();
        assert!(matches!(err, ZwiftError::InvalidHexInput { .. }));
        assert!(err.to_string().starts_with("invalid hex input"));
    }

    #[test]
    fn parse_hex_payload() {
        let packet = parse_telemetry_hex("080210b9603a0f18e807301e485a58910160dc017832").unwrap();
        assert_eq!(packet.zwift_user_id, 12345);
        assert_eq!(packet.cadence, 90);
        assert_eq!(packet.elevation_gain, 50);
    }
}
