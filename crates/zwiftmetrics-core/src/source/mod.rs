//! Capture inputs for the analysis pipeline.

mod pcap;

pub use pcap::PcapFileSource;

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured link-layer frame.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture timestamp in seconds since the Unix epoch, when known.
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// Anything that yields captured frames in order; `Ok(None)` marks the end.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture format error ({context}): {message}")]
    Format {
        context: &'static str,
        message: String,
    },
}

impl SourceError {
    pub(crate) fn format(context: &'static str, err: impl std::fmt::Display) -> Self {
        SourceError::Format {
            context,
            message: err.to_string(),
        }
    }
}
