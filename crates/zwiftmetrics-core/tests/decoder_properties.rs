//! Property-based tests for the player-state decoder.
//!
//! Payloads are built with a small reference encoder that follows the
//! general varint rules, then fed through the narrow decoder.

use proptest::prelude::*;
use zwiftmetrics_core::{
    DecodedMessage, DecodedValue, TelemetryPacket, ZwiftError, decode_message, parse_telemetry,
    read_varint,
};

fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn encode_field(field: u8, value: u64, out: &mut Vec<u8>) {
    out.push(field << 3);
    encode_varint(value, out);
}

fn encode_nested(field: u8, body: &[u8], out: &mut Vec<u8>) {
    out.push((field << 3) | 2);
    out.push(body.len() as u8);
    out.extend_from_slice(body);
}

/// Returns the payload and the offset of the player-state tag.
fn encode_packet(packet: &TelemetryPacket) -> (Vec<u8>, usize) {
    let mut state = Vec::new();
    encode_field(3, packet.distance as u64, &mut state);
    encode_field(6, packet.speed as u64, &mut state);
    encode_field(9, packet.cadence as u64, &mut state);
    encode_field(11, packet.heart_rate as u64, &mut state);
    encode_field(12, packet.power as u64, &mut state);
    encode_field(15, packet.elevation_gain as u64, &mut state);

    let mut payload = Vec::new();
    encode_field(1, packet.connection_status_id as u64, &mut payload);
    encode_field(2, packet.zwift_user_id as u64, &mut payload);
    encode_field(3, packet.world_timestamp as u64, &mut payload);
    let state_offset = payload.len();
    encode_nested(7, &state, &mut payload);
    (payload, state_offset)
}

fn packet_strategy() -> impl Strategy<Value = TelemetryPacket> {
    (
        (0i32..8, 0i32..i32::MAX, 0i64..i64::MAX),
        (0i64..10_000_000, 0i32..150_000, 0i32..200, 0i32..250, 0i32..2_500, 0i64..100_000),
    )
        .prop_map(
            |(
                (connection_status_id, zwift_user_id, world_timestamp),
                (distance, speed, cadence, heart_rate, power, elevation_gain),
            )| TelemetryPacket {
                connection_status_id,
                zwift_user_id,
                world_timestamp,
                distance,
                speed,
                cadence,
                heart_rate,
                power,
                elevation_gain,
            },
        )
}

#[test]
fn every_single_byte_varint_decodes_to_itself() {
    for value in 0u8..=127 {
        assert_eq!(read_varint(&[value]).unwrap(), (u64::from(value), 1));
    }
}

#[test]
fn reference_end_to_end_payload() {
    let mut state = Vec::new();
    for (field, value) in [(3, 1000), (6, 30), (9, 90), (11, 145), (12, 220), (15, 50)] {
        encode_field(field, value, &mut state);
    }
    let mut payload = Vec::new();
    encode_field(1, 2, &mut payload);
    encode_field(2, 12345, &mut payload);
    encode_nested(7, &state, &mut payload);

    let packet = parse_telemetry(&payload).unwrap();
    assert_eq!(
        packet,
        TelemetryPacket {
            connection_status_id: 2,
            zwift_user_id: 12345,
            world_timestamp: 0,
            distance: 1000,
            speed: 30,
            cadence: 90,
            heart_rate: 145,
            power: 220,
            elevation_gain: 50,
        }
    );
}

#[test]
fn decoding_is_independent_across_threads() {
    let payloads: Vec<Vec<u8>> = (0..8)
        .map(|power| {
            let packet = TelemetryPacket {
                connection_status_id: 1,
                zwift_user_id: 42,
                world_timestamp: 0,
                distance: 0,
                speed: 0,
                cadence: 0,
                heart_rate: 0,
                power: 100 + power,
                elevation_gain: 0,
            };
            encode_packet(&packet).0
        })
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = payloads
            .iter()
            .map(|payload| scope.spawn(move || parse_telemetry(payload).unwrap().power))
            .collect();
        let powers: Vec<i32> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(powers, (100..108).collect::<Vec<_>>());
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Multi-byte varints round-trip through the reference encoder.
    #[test]
    fn prop_multi_byte_varint_round_trip(value in 128u64..(1u64 << 32)) {
        let mut bytes = Vec::new();
        encode_varint(value, &mut bytes);
        prop_assert_eq!(read_varint(&bytes).unwrap(), (value, bytes.len()));
    }

    /// Trailing bytes after a varint are never consumed.
    #[test]
    fn prop_varint_stops_at_last_group(value: u64, trailing in proptest::collection::vec(any::<u8>(), 0..4)) {
        let mut bytes = Vec::new();
        encode_varint(value, &mut bytes);
        let len = bytes.len();
        bytes.extend_from_slice(&trailing);
        prop_assert_eq!(read_varint(&bytes).unwrap(), (value, len));
    }

    /// A nested body with an exact declared length decodes to the same
    /// message as decoding the body on its own.
    #[test]
    fn prop_nested_matches_independent_decode(
        values in proptest::collection::btree_map(0u8..16, any::<u32>(), 0..8),
    ) {
        let mut body = Vec::new();
        for (field, value) in &values {
            encode_field(*field, u64::from(*value), &mut body);
        }
        let mut payload = Vec::new();
        encode_nested(7, &body, &mut payload);

        let expected: DecodedMessage = values
            .iter()
            .map(|(field, value)| (*field, DecodedValue::Integer(i64::from(*value))))
            .collect();
        let message = decode_message(&payload).unwrap();
        prop_assert_eq!(message.get(7), Some(&DecodedValue::Nested(expected)));
    }

    /// A repeated field number is ignored: decoding equals decoding the
    /// message with the duplicate removed.
    #[test]
    fn prop_duplicate_field_is_ignored(
        field in 0u8..16,
        first: u32,
        second: u32,
        other in 0u8..16,
        other_value: u32,
    ) {
        prop_assume!(other != field);
        let mut with_duplicate = Vec::new();
        encode_field(field, u64::from(first), &mut with_duplicate);
        encode_field(other, u64::from(other_value), &mut with_duplicate);
        encode_field(field, u64::from(second), &mut with_duplicate);

        let mut without = Vec::new();
        encode_field(field, u64::from(first), &mut without);
        encode_field(other, u64::from(other_value), &mut without);

        prop_assert_eq!(
            decode_message(&with_duplicate).unwrap(),
            decode_message(&without).unwrap()
        );
    }

    /// Encoded telemetry decodes back to the same packet.
    #[test]
    fn prop_packet_decodes(packet in packet_strategy()) {
        let (payload, _) = encode_packet(&packet);
        prop_assert_eq!(parse_telemetry(&payload).unwrap(), packet);
    }

    /// No strict prefix of a valid payload yields a packet; a prefix that
    /// ends inside the player state fails as truncated.
    #[test]
    fn prop_truncated_payload_never_yields_packet(packet in packet_strategy(), cut in 1usize..64) {
        let (payload, state_offset) = encode_packet(&packet);
        prop_assume!(cut < payload.len());
        let len = payload.len() - cut;
        let result = parse_telemetry(&payload[..len]);
        if len > state_offset {
            prop_assert!(
                matches!(result, Err(ZwiftError::TruncatedMessage { .. })),
                "expected truncation for prefix of {} bytes, got {:?}", len, result
            );
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Wire types 1 and 5 are rejected at their own tag.
    #[test]
    fn prop_unsupported_wire_type_is_rejected(
        field in 0u8..16,
        wire_type in prop_oneof![Just(1u8), Just(5u8)],
        prefix in 0u64..1000,
        trailing in proptest::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut payload = Vec::new();
        encode_field(1, prefix, &mut payload);
        let offset = payload.len();
        payload.push((field << 3) | wire_type);
        payload.extend_from_slice(&trailing);

        prop_assert_eq!(
            decode_message(&payload).unwrap_err(),
            ZwiftError::UnsupportedWireType { field, wire_type, offset }
        );
    }
}
