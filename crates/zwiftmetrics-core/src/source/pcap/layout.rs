pub const PCAP_READER_BUFFER_SIZE: usize = 65536;
/// Section header block type; little and big endian files share it.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];
pub const MICROS_PER_SECOND: u64 = 1_000_000;
