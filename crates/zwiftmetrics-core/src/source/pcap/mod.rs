//! PCAP/PCAPNG source implementation.
//!
//! Stands in for a live capture: the file is read block by block and every
//! captured frame is emitted as a raw packet event with its link type, so
//! the analysis layer can extract the player-state datagrams.

pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
