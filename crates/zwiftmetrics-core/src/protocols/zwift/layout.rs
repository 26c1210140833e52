/// UDP destination port of the game's outgoing player-state datagrams.
pub const ZWIFT_OUTGOING_PORT: u16 = 3022;

pub const TAG_CONTINUATION_BIT: u8 = 0x80;
pub const TAG_FIELD_SHIFT: u8 = 3;
pub const TAG_FIELD_MASK: u8 = 0x0F;
pub const TAG_WIRE_TYPE_MASK: u8 = 0x07;

pub const WIRE_TYPE_VARINT: u8 = 0;
pub const WIRE_TYPE_LENGTH_DELIMITED: u8 = 2;

pub const VARINT_CONTINUATION_BIT: u8 = 0x80;
pub const VARINT_GROUP_MASK: u8 = 0x7F;
pub const VARINT_GROUP_BITS: u32 = 7;
pub const VARINT_MAX_GROUPS: usize = 10;
/// The tenth group only carries bit 63.
pub const VARINT_LAST_GROUP_MAX: u8 = 0x01;

pub const FIELD_CONNECTION_STATUS_ID: u8 = 1;
pub const FIELD_ZWIFT_USER_ID: u8 = 2;
pub const FIELD_WORLD_TIMESTAMP: u8 = 3;
pub const FIELD_PLAYER_STATE: u8 = 7;

pub mod player_state {
    pub const DISTANCE: u8 = 3;
    pub const SPEED: u8 = 6;
    pub const CADENCE: u8 = 9;
    pub const HEART_RATE: u8 = 11;
    pub const POWER: u8 = 12;
    pub const ELEVATION_GAIN: u8 = 15;
}
