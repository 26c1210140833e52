use std::fs;
use std::path::Path;

use etherparse::PacketBuilder;

/// Reference player-state payload: user 12345, 220 W, 145 bpm.
pub const PLAYER_STATE: [u8; 22] = [
    0x08, 0x02, 0x10, 0xb9, 0x60, 0x3a, 0x0f, 0x18, 0xe8, 0x07, 0x30, 0x1e, 0x48, 0x5a, 0x58, 0x91,
    0x01, 0x60, 0xdc, 0x01, 0x78, 0x32,
];

pub fn udp_frame(dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([192, 168, 1, 20], [52, 0, 0, 1], 64)
        .udp(50000, dst_port);
    let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("build frame");
    frame
}

/// Write a legacy (microsecond) PCAP file with Ethernet link type.
pub fn write_pcap(path: &Path, frames: &[(u32, Vec<u8>)]) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&65535u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    for (ts_sec, frame) in frames {
        let len = frame.len() as u32;
        bytes.extend_from_slice(&ts_sec.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(frame);
    }
    fs::write(path, bytes).expect("write pcap");
}
