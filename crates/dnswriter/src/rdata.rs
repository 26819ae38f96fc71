use std::{
    net::{Ipv4Addr, Ipv6Addr},
    sync::Arc,
};

use num_enum::IntoPrimitive;

use crate::{
    domain_name::DomainName,
    error::{PacketError, Result},
    writer::DnsPacketWriter,
};

/// Trait for types that can write themselves into the pending record.
pub trait DnsWritable {
    /// Append the wire form to the record data. May leave a partial write
    /// behind on error, callers go through [`write_to`](Self::write_to).
    fn encode(&self, writer: &mut DnsPacketWriter<'_>) -> Result<()>;

    /// Write into the pending record, all or nothing.
    fn write_to(&self, writer: &mut DnsPacketWriter<'_>) -> Result<()> {
        writer.write_rdata(self)
    }
}

/// Typed record data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    Raw(Vec<u8>),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// TXT data, written as consecutive character-strings of up to 255 bytes.
    Text(Arc<str>),

    SOA {
        /// Primary nameserver.
        mname: DomainName,
        /// Contact email
        rname: DomainName,
        /// Serial
        serial: u32,
        /// Refresh
        refresh: u32,
        /// Retry
        retry: u32,
        /// Expire
        expire: u32,
        /// Minimum
        minimum: u32,
    },
    MX {
        priority: u16,
        host: DomainName,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },
    /// NS, CNAME, PTR and friends.
    DomainName(DomainName),
}

impl DnsWritable for RecordData {
    fn encode(&self, writer: &mut DnsPacketWriter<'_>) -> Result<()> {
        match self {
            RecordData::Raw(data) => writer.write_blob(data),
            RecordData::Ipv4(addr) => writer.write_ipv4(*addr),
            RecordData::Ipv6(addr) => writer.write_ipv6(*addr),
            RecordData::Text(text) => {
                if text.is_empty() {
                    return writer.write_text("");
                }
                for chunk in text.as_bytes().chunks(u8::MAX as usize) {
                    writer.write_text(chunk)?;
                }
                Ok(())
            }
            RecordData::DomainName(name) => writer.write_name(name),

            RecordData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                writer.write_name(mname)?;
                writer.write_name(rname)?;
                writer.write_u32(*serial)?;
                writer.write_u32(*refresh)?;
                writer.write_u32(*retry)?;
                writer.write_u32(*expire)?;
                writer.write_u32(*minimum)?;
                Ok(())
            }
            RecordData::MX { priority, host } => {
                writer.write_u16(*priority)?;
                writer.write_name(host)?;
                Ok(())
            }
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                writer.write_u16(*priority)?;
                writer.write_u16(*weight)?;
                writer.write_u16(*port)?;
                // RFC 2782 forbids compressing the target.
                writer.write_name_uncompressed(target)?;
                Ok(())
            }
        }
    }
}

/// EDNS Option codes
///
/// Based on: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-11
#[derive(Debug, Clone, Copy, PartialEq, IntoPrimitive)]
#[repr(u16)]
pub enum EdnsOptionCode {
    /// DNS Name Server Identifier (NSID) Option
    NSID = 3,
    /// Client Subnet in DNS Queries (RFC 7871)
    ClientSubnet = 8,
    /// EDNS expire (RFC 7314)
    Expire = 9,
    /// EDNS Cookie (RFC 7873)
    Cookie = 10,
    /// EDNS TCP Keep Alive (RFC 7828)
    TcpKeepAlive = 11,
    /// EDNS Padding (7830)
    Padding = 12,
    /// Extended DNS error (RFC 8914)
    ExtendedDnsError = 15,
}

/// EDNS option, written into the rdata of a pending OPT record.
#[derive(Debug, Clone, PartialEq)]
pub struct EdnsOption {
    code: u16,
    data: Vec<u8>,
}

impl EdnsOption {
    pub fn new(code: EdnsOptionCode, data: Vec<u8>) -> Self {
        Self {
            code: code.into(),
            data,
        }
    }

    /// An option with a code not covered by [`EdnsOptionCode`].
    pub fn raw(code: u16, data: Vec<u8>) -> Self {
        Self { code, data }
    }

    /// Padding of `len` zero bytes.
    pub fn padding(len: usize) -> Self {
        Self::new(EdnsOptionCode::Padding, vec![0; len])
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl DnsWritable for EdnsOption {
    fn encode(&self, writer: &mut DnsPacketWriter<'_>) -> Result<()> {
        let len = u16::try_from(self.data.len()).map_err(|_| PacketError::RecordTooLarge {
            size: self.data.len(),
        })?;
        writer.write_u16(self.code)?;
        writer.write_u16(len)?;
        writer.write_blob(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::message::{ClassType, RecordType, Section};

    fn records_of(data: &RecordData, rtype: RecordType) -> Vec<u8> {
        let mut buf = BytesMut::new();
        let mut writer = DnsPacketWriter::new(&mut buf, "example.com", RecordType::A, ClassType::IN).unwrap();
        writer
            .add_record("example.com", rtype, 60, ClassType::IN, Section::Answer, data)
            .unwrap();
        writer.commit().unwrap();
        writer.records().to_vec()
    }

    #[test]
    fn test_mx_compresses_host() {
        let data = RecordData::MX {
            priority: 10,
            host: DomainName::from_ascii("mail.example.com").unwrap(),
        };
        let records = records_of(&data, RecordType::MX);
        // owner pointer + fixed fields, then priority, "mail" and a pointer to the question name
        assert_eq!(&records[..2], &[0xC0, 0x0C]);
        assert_eq!(&records[10..12], &[0, 9]);
        assert_eq!(&records[12..], &[0, 10, 4, b'm', b'a', b'i', b'l', 0xC0, 0x0C]);
    }

    #[test]
    fn test_srv_target_uncompressed() {
        let data = RecordData::SRV {
            priority: 1,
            weight: 2,
            port: 443,
            target: DomainName::from_ascii("example.com").unwrap(),
        };
        let records = records_of(&data, RecordType::SRV);
        let rdata = &records[12..];
        assert_eq!(&rdata[..6], &[0, 1, 0, 2, 0x01, 0xBB]);
        assert_eq!(&rdata[6..], b"\x07example\x03com\x00");
    }

    #[test]
    fn test_long_text_is_chunked() {
        let text: String = "x".repeat(300);
        let records = records_of(&RecordData::Text(text.into()), RecordType::TXT);
        let rdata = &records[12..];
        assert_eq!(rdata.len(), 302);
        assert_eq!(rdata[0], 255);
        assert_eq!(rdata[256], 45);
    }

    #[test]
    fn test_empty_text() {
        let records = records_of(&RecordData::Text("".into()), RecordType::TXT);
        assert_eq!(&records[10..], &[0, 1, 0]);
    }

    #[test]
    fn test_edns_option() {
        let mut buf = BytesMut::new();
        let mut writer = DnsPacketWriter::new(&mut buf, "example.com", RecordType::A, ClassType::IN).unwrap();
        writer.start_opt(1232, 0, 0, 0x8000).unwrap();
        EdnsOption::new(EdnsOptionCode::Cookie, vec![1, 2, 3, 4, 5, 6, 7, 8])
            .write_to(&mut writer)
            .unwrap();
        EdnsOption::padding(2).write_to(&mut writer).unwrap();
        writer.commit().unwrap();

        let records = writer.records();
        // root, OPT, class 1232, ttl with DO, rdlength
        assert_eq!(&records[..11], &[0, 0, 41, 0x04, 0xD0, 0, 0, 0x80, 0, 0, 18]);
        assert_eq!(&records[11..15], &[0, 10, 0, 8]);
        assert_eq!(&records[23..], &[0, 12, 0, 2, 0, 0]);
    }

    #[test]
    fn test_failed_option_leaves_rdata_intact() {
        let mut buf = BytesMut::new();
        let mut writer = DnsPacketWriter::new(&mut buf, "example.com", RecordType::A, ClassType::IN).unwrap();
        writer.start_opt(1232, 0, 0, 0).unwrap();
        EdnsOption::new(EdnsOptionCode::Cookie, vec![1, 2, 3, 4, 5, 6, 7, 8])
            .write_to(&mut writer)
            .unwrap();
        assert_eq!(writer.pending_size(), 11 + 12);

        // header fits, the data does not
        let err = EdnsOption::padding(65533).write_to(&mut writer).unwrap_err();
        assert!(matches!(err, PacketError::RecordTooLarge { .. }));
        assert_eq!(writer.pending_size(), 11 + 12);

        writer.commit().unwrap();
        let records = writer.records();
        assert_eq!(&records[9..11], &[0, 12]);
        assert_eq!(&records[11..], &[0, 10, 0, 8, 1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
