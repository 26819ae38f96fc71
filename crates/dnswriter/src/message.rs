use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{error::PacketError, u16_enum_with_unknown};

/// Message sections, in the order they must appear on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Section {
    #[default]
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    /// Byte offset of this section's counter inside the header.
    pub(crate) const fn count_offset(self) -> usize {
        match self {
            Section::Question => 4,
            Section::Answer => 6,
            Section::Authority => 8,
            Section::Additional => 10,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Section::Question => 0,
            Section::Answer => 1,
            Section::Authority => 2,
            Section::Additional => 3,
        }
    }
}

u16_enum_with_unknown! {
    /// DNS record types.
    ///
    /// Based on: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    pub enum RecordType {
        /// IPv4
        A = 1,
        /// Name server
        NS = 2,
        /// Canonical name
        CNAME = 5,
        /// Start of authority
        SOA = 6,
        /// Null
        NULL = 10,
        /// Pointer (for reverse DNS)
        PTR = 12,
        /// HINFO
        HINFO = 13,
        /// Mail exchange
        MX = 15,
        /// Text strings
        TXT = 16,
        /// IPv6
        AAAA = 28,
        /// Server selection
        SRV = 33,
        /// Naming authority pointer
        NAPTR = 35,
        /// EDNS pseudo record
        OPT = 41,
        /// Delegation signer
        DS = 43,
        /// SSH key fingerprint
        SSHFP = 44,
        /// DNSSEC signature
        RRSIG = 46,
        /// Next secure
        NSEC = 47,
        /// DNS key
        DNSKEY = 48,
        /// NSEC3
        NSEC3 = 50,
        /// TLSA certificate association
        TLSA = 52,
        /// General-purpose service binding
        SVCB = 64,
        /// SVCB-compatible type for use with HTTP
        HTTPS = 65,
        /// SPF
        SPF = 99,
        /// Transaction Signature
        TSIG = 250,
        /// Incremental transfer
        IXFR = 251,
        /// transfer of an entire zone
        AXFR = 252,
        /// All records
        ANY = 255,
        /// Certification Authority Restriction
        CAA = 257,
    }
}

u16_enum_with_unknown! {
    /// DNS classes. OPT records reuse the field for the UDP payload size,
    /// which comes out as `Unknown(size)`.
    pub enum ClassType {
        /// Internet
        IN = 1,
        /// Chaosnet
        CH = 3,
        /// Hesoid (MIT Athena)
        HS = 4,
        /// None (dynamic updates)
        NONE = 254,
        /// Any
        ANY = 255,
    }
}

impl Default for ClassType {
    fn default() -> Self {
        ClassType::IN
    }
}

/// Dns response code
///
/// Based on: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6
#[derive(Debug, Copy, Clone, Default, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum DnsResponseCode {
    /// No error, the request was successful
    #[default]
    NoError = 0,
    /// Format error, the request was malformed
    FormatError = 1,
    /// Server failure, the server encountered an error while processing the request
    ServerFailure = 2,
    /// Non-existent domain, the requested domain does not exist
    NxDomain = 3,
    /// Not Implemented
    NotImp = 4,
    /// Query refused
    Refused = 5,
    /// Name Exists when it should not
    YXDomain = 6,
    /// RR Set Exists when it should not
    YXRRSet = 7,
    /// RR Set that should exist does not
    NXRRSet = 8,
    /// Server Not Authoritative for zone
    NotAuth = 9,
    /// Name not contained in zone
    NotZone = 10,
    /// Bad OPT Version
    BADVERS = 16,
    /// Bad/missing Server Cookie
    BADCOOKIE = 23,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DnsOpcode {
    /// Standard query
    #[default]
    Query = 0,
    /// Inverse query, obsolete
    IQuery = 1,
    /// Server status request, obsolete
    Status = 2,
    /// Zone change notification
    Notify = 4,
    /// Dynamic update
    Update = 5,
}

/// The 16-bit flags word of the header.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DnsFlags {
    /// Query or Response
    pub response: bool,
    /// Opcode
    pub opcode: DnsOpcode,
    /// Authoritative Answer
    pub authorative_answer: bool,
    /// Truncated, the message did not fit and was cut short
    pub truncated: bool,
    /// Recursion Desired, indicates that the client desires recursive resolution
    pub recursion_desired: bool,
    /// Recursion Available, indicates that the server supports recursive resolution
    pub recursion_available: bool,
    /// Z flag, reserved, must be zero
    pub(crate) z: bool,
    /// Authentic Data
    pub authentic_data: bool,
    /// Checking Disabled
    pub checking_disabled: bool,
    // Lower part of the response code.
    pub(crate) rcode_low: u8,
}

impl DnsFlags {
    /// Set the response code. The low four bits live in the header; the
    /// returned high bits belong in the OPT record's extended rcode.
    pub fn set_response_code(&mut self, response_code: DnsResponseCode) -> u8 {
        let full: u16 = response_code.into();
        self.rcode_low = (full & 0x0F) as u8;
        (full >> 4) as u8
    }

    /// Lower four bits of the response code.
    pub fn rcode_low(&self) -> u8 {
        self.rcode_low
    }

    pub fn to_u16(&self) -> u16 {
        let opcode: u8 = self.opcode.into();
        ((self.response as u16) << 15)
            | ((opcode as u16) << 11)
            | ((self.authorative_answer as u16) << 10)
            | ((self.truncated as u16) << 9)
            | ((self.recursion_desired as u16) << 8)
            | ((self.recursion_available as u16) << 7)
            | ((self.z as u16) << 6)
            | ((self.authentic_data as u16) << 5)
            | ((self.checking_disabled as u16) << 4)
            | (self.rcode_low & 0x0F) as u16
    }
}

impl TryFrom<u16> for DnsFlags {
    type Error = PacketError;

    fn try_from(bytes: u16) -> Result<Self, Self::Error> {
        let opcode = ((bytes >> 11) & 0xF) as u8;
        Ok(Self {
            response: (bytes >> 15) & 0x1 != 0,
            opcode: DnsOpcode::try_from(opcode).map_err(|_| PacketError::InvalidOpcode(opcode))?,
            authorative_answer: (bytes >> 10) & 0x1 != 0,
            truncated: (bytes >> 9) & 0x1 != 0,
            recursion_desired: (bytes >> 8) & 0x1 != 0,
            recursion_available: (bytes >> 7) & 0x1 != 0,
            z: (bytes >> 6) & 0x1 != 0,
            authentic_data: (bytes >> 5) & 0x1 != 0,
            checking_disabled: (bytes >> 4) & 0x1 != 0,
            rcode_low: (bytes & 0x0F) as u8,
        })
    }
}
