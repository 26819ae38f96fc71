use crate::{
    error::{PacketError, Result},
    message::{DnsFlags, Section},
};

/// Size of the fixed DNS header.
pub const HEADER_LEN: usize = 12;

/// The fixed 12-byte DNS header.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DnsHeader {
    /// Transaction id
    pub id: u16,
    /// Flags
    pub flags: DnsFlags,
    /// QDCOUNT
    pub question_count: u16,
    /// ANCOUNT
    pub answer_count: u16,
    /// NSCOUNT
    pub authority_count: u16,
    /// ARCOUNT
    pub additional_count: u16,
}

impl DnsHeader {
    /// Decode a header from the first 12 bytes of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(PacketError::HeaderTooShort { len: data.len() });
        }

        Ok(Self {
            id: read_u16(data, 0),
            flags: DnsFlags::try_from(read_u16(data, 2))?,
            question_count: read_u16(data, Section::Question.count_offset()),
            answer_count: read_u16(data, Section::Answer.count_offset()),
            authority_count: read_u16(data, Section::Authority.count_offset()),
            additional_count: read_u16(data, Section::Additional.count_offset()),
        })
    }

    /// Encode the header into its wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        write_u16(&mut out, 0, self.id);
        write_u16(&mut out, 2, self.flags.to_u16());
        write_u16(&mut out, Section::Question.count_offset(), self.question_count);
        write_u16(&mut out, Section::Answer.count_offset(), self.answer_count);
        write_u16(&mut out, Section::Authority.count_offset(), self.authority_count);
        write_u16(&mut out, Section::Additional.count_offset(), self.additional_count);
        out
    }

    /// Record count for a section.
    pub fn count(&self, section: Section) -> u16 {
        match section {
            Section::Question => self.question_count,
            Section::Answer => self.answer_count,
            Section::Authority => self.authority_count,
            Section::Additional => self.additional_count,
        }
    }
}

#[inline]
pub(crate) fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

/// Overwrite a big-endian u16 in place.
#[inline]
pub(crate) fn write_u16(data: &mut [u8], at: usize, value: u16) {
    data[at..at + 2].copy_from_slice(&value.to_be_bytes());
}
