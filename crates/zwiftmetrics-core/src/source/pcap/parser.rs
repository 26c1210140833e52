use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::layout;
use super::reader::{
    CaptureFormat, enhanced_packet_seconds, interface_linktype, record_seconds, sniff_format,
};

/// Packet source reading captured frames from a PCAP or PCAPNG file.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

struct ReaderContext {
    next: &'static str,
    refill: &'static str,
}

const LEGACY_CONTEXT: ReaderContext = ReaderContext {
    next: "pcap reader next",
    refill: "pcap reader refill",
};

const NG_CONTEXT: ReaderContext = ReaderContext {
    next: "pcapng reader next",
    refill: "pcapng reader refill",
};

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        let event = match &mut self.inner {
            PcapReader::Legacy { reader, linktype } => {
                next_event(reader, &LEGACY_CONTEXT, |block| match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        *linktype = Some(header.network);
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                        ts: Some(record_seconds(packet.ts_sec, packet.ts_usec)),
                        linktype: linktype.unwrap_or(Linktype::ETHERNET),
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
            PcapReader::Ng { reader, linktypes } => {
                next_event(reader, &NG_CONTEXT, |block| match block {
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        linktypes.push(intf.linktype);
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(PacketEvent {
                        ts: Some(enhanced_packet_seconds(packet.ts_high, packet.ts_low)),
                        linktype: interface_linktype(linktypes, packet.if_id),
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
        };
        Ok(event)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, SourceError> {
    let reader = match sniff_format(&mut file)? {
        CaptureFormat::Ng => PcapReader::Ng {
            reader: PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                .map_err(|e| SourceError::format("pcapng reader init", e))?,
            linktypes: Vec::new(),
        },
        CaptureFormat::Legacy => PcapReader::Legacy {
            reader: LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                .map_err(|e| SourceError::format("pcap reader init", e))?,
            linktype: None,
        },
    };
    Ok(reader)
}

/// Pull blocks until `on_block` turns one into a packet event or the file
/// ends.
fn next_event<R, F>(
    reader: &mut R,
    context: &ReaderContext,
    mut on_block: F,
) -> Result<Option<PacketEvent>, SourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| SourceError::format(context.refill, e))?;
            }
            Err(e) => return Err(SourceError::format(context.next, e)),
        }
    }
}
