use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::layout;
use crate::source::SourceError;

/// Container format of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy,
    Ng,
}

/// Identify the container from its leading block type, leaving the reader
/// positioned at the start of the file.
///
/// Anything that is not PCAPNG is handed to the legacy reader, which
/// reports unknown magic numbers itself.
pub fn sniff_format<R: Read + Seek>(reader: &mut R) -> Result<CaptureFormat, SourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(if magic == layout::PCAPNG_MAGIC {
        CaptureFormat::Ng
    } else {
        CaptureFormat::Legacy
    })
}

/// Link type of a PCAPNG interface; frames from undeclared interfaces are
/// treated as Ethernet.
pub fn interface_linktype(linktypes: &[Linktype], if_id: u32) -> Linktype {
    usize::try_from(if_id)
        .ok()
        .and_then(|index| linktypes.get(index))
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}

/// Legacy record timestamp (seconds plus microseconds) as fractional seconds.
pub fn record_seconds(ts_sec: u32, ts_usec: u32) -> f64 {
    micros_to_seconds(u64::from(ts_sec) * layout::MICROS_PER_SECOND + u64::from(ts_usec))
}

/// Enhanced packet timestamp split in 32-bit halves, assuming the default
/// microsecond resolution.
pub fn enhanced_packet_seconds(ts_high: u32, ts_low: u32) -> f64 {
    micros_to_seconds((u64::from(ts_high) << 32) | u64::from(ts_low))
}

fn micros_to_seconds(micros: u64) -> f64 {
    micros as f64 / layout::MICROS_PER_SECOND as f64
}
