pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::parse_udp_packet;
