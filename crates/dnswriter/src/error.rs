use thiserror::Error;

use crate::message::Section;

pub type Result<T> = std::result::Result<T, PacketError>;

/// Errors raised while building a DNS message.
#[derive(Debug, Error)]
pub enum PacketError {
    /// A record was started in a section that precedes the current one.
    #[error("cannot start a {requested:?} record after the {current:?} section")]
    SectionOrder { current: Section, requested: Section },

    /// The rdata of the pending record would not fit the 16-bit rdlength field.
    #[error("record data too large: {size} bytes (max 65535)")]
    RecordTooLarge { size: usize },

    /// Committing the pending record would grow the message past 65535 bytes.
    #[error("message too large: {size} bytes (max 65535)")]
    MessageTooLarge { size: usize },

    #[error("invalid domain name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("character string too long: {len} bytes (max 255)")]
    TextTooLong { len: usize },

    #[error("invalid hex blob: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Record data was written while no record was started.
    #[error("no record in progress")]
    NoPendingRecord,

    #[error("dns header too short: {len} bytes (need 12)")]
    HeaderTooShort { len: usize },

    #[error("invalid opcode {0}")]
    InvalidOpcode(u8),
}
