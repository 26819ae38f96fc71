use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};

use crate::{
    compress::{self, CompressionTable},
    error::{PacketError, Result},
    header::{self, DnsHeader, HEADER_LEN},
    message::{ClassType, DnsFlags, RecordType, Section},
    rdata::{DnsWritable, RecordData},
};

/// Largest rdata the 16-bit rdlength field can describe.
pub const MAX_RDATA_LEN: usize = u16::MAX as usize;

/// Largest message we will build (the TCP length prefix limit).
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// TTL used by [`DnsPacketWriter::start_record_with_defaults`].
pub const DEFAULT_TTL: u32 = 3600;

/// Type, class, ttl and rdlength following the owner name.
const RR_FIXED_LEN: usize = 10;

#[derive(Debug, Clone, Copy)]
struct PendingRecord {
    rtype: RecordType,
    class: ClassType,
    ttl: u32,
    section: Section,
    /// Cursor value before this record was started.
    previous_section: Section,
}

/// State as it was right before the last successful commit.
#[derive(Debug, Clone, Copy)]
struct RollbackMark {
    len: usize,
    counts: [u16; 4],
    section: Section,
}

/// Writes a DNS message into a caller owned buffer, one record at a time.
///
/// The buffer holds a complete, self-consistent message only right after a
/// [`commit`](Self::commit). Starting a record commits the one in progress, so
/// a typical sequence is:
///
/// ```
/// use bytes::BytesMut;
/// use dnswriter::{ClassType, DnsPacketWriter, RecordType, Section};
///
/// let mut buf = BytesMut::new();
/// let mut writer = DnsPacketWriter::new(&mut buf, "example.com.", RecordType::A, ClassType::IN).unwrap();
/// writer.start_record("example.com.", RecordType::A, 3600, ClassType::IN, Section::Answer).unwrap();
/// writer.write_u32(0x01020304).unwrap();
/// writer.start_record("example.com.", RecordType::A, 3600, ClassType::IN, Section::Answer).unwrap(); // commits the first
/// writer.write_u32(0x04030201).unwrap();
/// writer.commit().unwrap();
/// assert_eq!(writer.header().unwrap().answer_count, 2);
/// ```
pub struct DnsPacketWriter<'a> {
    content: &'a mut BytesMut,
    /// Encoded owner name of the pending record.
    owner: BytesMut,
    /// Rdata of the pending record.
    record: BytesMut,
    pending: Option<PendingRecord>,
    labels: CompressionTable,
    counts: [u16; 4],
    section: Section,
    start_of_records: usize,
    rollback: Option<RollbackMark>,
}

impl<'a> DnsPacketWriter<'a> {
    /// Start a message in `content` with a single question.
    ///
    /// `content` is cleared first. The header starts out zeroed apart from
    /// QDCOUNT, use [`set_id`](Self::set_id) and [`set_flags`](Self::set_flags)
    /// to fill it in.
    pub fn new(content: &'a mut BytesMut, qname: &str, qtype: RecordType, qclass: ClassType) -> Result<Self> {
        let mut labels = CompressionTable::new();
        let mut question = BytesMut::with_capacity(qname.len() + 6);
        compress::write_name(&mut labels, &mut question, HEADER_LEN, qname, false)?;
        question.put_u16(qtype.to_u16());
        question.put_u16(qclass.to_u16());

        let header = DnsHeader {
            question_count: 1,
            ..Default::default()
        };

        content.clear();
        content.extend_from_slice(&header.encode());
        content.extend_from_slice(&question);
        let start_of_records = content.len();

        Ok(Self {
            content,
            owner: BytesMut::new(),
            record: BytesMut::new(),
            pending: None,
            labels,
            counts: [1, 0, 0, 0],
            section: Section::Question,
            start_of_records,
            rollback: None,
        })
    }

    /// Start a new record.
    ///
    /// Any record in progress is committed first, exactly as if
    /// [`commit`](Self::commit) had been called; if that fails the error is
    /// returned and the new record is not started. Records must be added in
    /// section order, a section earlier than the current one is a
    /// [`PacketError::SectionOrder`] error.
    ///
    /// Nothing is written to the output until the record is committed.
    pub fn start_record(
        &mut self,
        name: &str,
        rtype: RecordType,
        ttl: u32,
        class: ClassType,
        section: Section,
    ) -> Result<()> {
        self.commit()?;

        if section == Section::Question || section < self.section {
            return Err(PacketError::SectionOrder {
                current: self.section,
                requested: section,
            });
        }

        // The owner name lands right at the current end of the message, so it
        // can be encoded now and rdata names can point into it.
        self.owner.clear();
        self.record.clear();
        compress::write_name(&mut self.labels, &mut self.owner, self.content.len(), name, true)?;

        self.pending = Some(PendingRecord {
            rtype,
            class,
            ttl,
            section,
            previous_section: self.section,
        });
        self.section = section;
        Ok(())
    }

    /// [`start_record`](Self::start_record) with a TTL of 3600 and class IN.
    pub fn start_record_with_defaults(&mut self, name: &str, rtype: RecordType, section: Section) -> Result<()> {
        self.start_record(name, rtype, DEFAULT_TTL, ClassType::IN, section)
    }

    /// Start a record and fill in its rdata from `data`. The record stays
    /// pending until the next commit. If `data` cannot be written the record
    /// is abandoned.
    pub fn add_record(
        &mut self,
        name: &str,
        rtype: RecordType,
        ttl: u32,
        class: ClassType,
        section: Section,
        data: &RecordData,
    ) -> Result<()> {
        self.start_record(name, rtype, ttl, class, section)?;
        if let Err(e) = self.write_rdata(data) {
            self.abandon();
            return Err(e);
        }
        Ok(())
    }

    /// Encode `data` into the pending record. On error the record data and
    /// the compression table are left as they were before the call.
    pub fn write_rdata<T: DnsWritable + ?Sized>(&mut self, data: &T) -> Result<()> {
        let len = self.record.len();
        let offset = self.rdata_offset();
        match data.encode(self) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record.truncate(len);
                self.labels.truncate(offset);
                Err(e)
            }
        }
    }

    /// Add and commit an EDNS0 OPT record advertising `udp_payload_size`.
    pub fn add_opt(&mut self, udp_payload_size: u16, extended_rcode: u8, z: u16) -> Result<()> {
        self.start_opt(udp_payload_size, extended_rcode, 0, z)?;
        self.commit()
    }

    /// Start an OPT record without committing it, so options can be written
    /// into its rdata.
    pub fn start_opt(&mut self, udp_payload_size: u16, extended_rcode: u8, version: u8, z: u16) -> Result<()> {
        let ttl = ((extended_rcode as u32) << 24) | ((version as u32) << 16) | z as u32;
        self.start_record(
            ".",
            RecordType::OPT,
            ttl,
            ClassType::from(udp_payload_size),
            Section::Additional,
        )
    }

    /// Write the pending record to the output and update the header.
    ///
    /// Does nothing when no record is pending, so it is safe to call
    /// repeatedly. On error nothing is written and the record stays pending;
    /// drop it with [`abandon`](Self::abandon) or [`rollback`](Self::rollback).
    pub fn commit(&mut self) -> Result<()> {
        let Some(pending) = self.pending else {
            return Ok(());
        };

        let rdlen = self.record.len();
        if rdlen > MAX_RDATA_LEN {
            return Err(PacketError::RecordTooLarge { size: rdlen });
        }

        let size = self.content.len() + self.owner.len() + RR_FIXED_LEN + rdlen;
        if size > MAX_MESSAGE_LEN {
            return Err(PacketError::MessageTooLarge { size });
        }

        let mark = RollbackMark {
            len: self.content.len(),
            counts: self.counts,
            section: pending.previous_section,
        };

        self.content.extend_from_slice(&self.owner);
        self.content.put_u16(pending.rtype.to_u16());
        self.content.put_u16(pending.class.to_u16());
        self.content.put_u32(pending.ttl);
        self.content.put_u16(rdlen as u16);
        self.content.extend_from_slice(&self.record);

        self.counts[pending.section.index()] += 1;
        self.write_count(pending.section);

        tracing::trace!(
            "committed {:?} record in {:?}: rdlen={} size={}",
            pending.rtype,
            pending.section,
            rdlen,
            self.content.len()
        );

        self.rollback = Some(mark);
        self.pending = None;
        self.owner.clear();
        self.record.clear();
        Ok(())
    }

    /// Drop the pending record, if any, without touching the output.
    pub fn abandon(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        tracing::debug!("abandoning pending {:?} record", pending.rtype);
        self.section = pending.previous_section;
        self.owner.clear();
        self.record.clear();
        self.labels.truncate(self.content.len());
        true
    }

    /// Remove the most recent record.
    ///
    /// A pending record is dropped and the committed message is left alone.
    /// Otherwise the last commit is undone. Only one commit can be undone:
    /// calling this again before the next commit returns `false` and leaves
    /// the message as is.
    pub fn rollback(&mut self) -> bool {
        if self.abandon() {
            return true;
        }

        let Some(mark) = self.rollback.take() else {
            return false;
        };

        self.content.truncate(mark.len);
        self.counts = mark.counts;
        self.section = mark.section;
        for section in [Section::Answer, Section::Authority, Section::Additional] {
            self.write_count(section);
        }
        self.labels.truncate(mark.len);

        tracing::trace!("rolled back to {} bytes", mark.len);
        true
    }

    /// Commit any pending record and return the final message size.
    pub fn finish(mut self) -> Result<usize> {
        self.commit()?;
        Ok(self.content.len())
    }

    #[inline]
    fn write_count(&mut self, section: Section) {
        header::write_u16(&mut self.content[..], section.count_offset(), self.counts[section.index()]);
    }

    #[inline]
    fn ensure_space(&self, need: usize) -> Result<()> {
        if self.pending.is_none() {
            return Err(PacketError::NoPendingRecord);
        }
        let size = self.record.len() + need;
        if size > MAX_RDATA_LEN {
            return Err(PacketError::RecordTooLarge { size });
        }
        Ok(())
    }

    /// Message offset the next rdata byte will have once committed.
    #[inline]
    fn rdata_offset(&self) -> usize {
        self.content.len() + self.owner.len() + RR_FIXED_LEN + self.record.len()
    }

    /// Write a u8 to the record data.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_space(std::mem::size_of::<u8>())?;
        self.record.put_u8(value);
        Ok(())
    }

    /// Write a u16 to the record data.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.ensure_space(std::mem::size_of::<u16>())?;
        self.record.put_u16(value);
        Ok(())
    }

    /// Write a u32 to the record data.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.ensure_space(std::mem::size_of::<u32>())?;
        self.record.put_u32(value);
        Ok(())
    }

    pub fn write_type(&mut self, rtype: RecordType) -> Result<()> {
        self.write_u16(rtype.to_u16())
    }

    pub fn write_ipv4(&mut self, addr: Ipv4Addr) -> Result<()> {
        self.write_u32(addr.to_bits())
    }

    pub fn write_ipv6(&mut self, addr: Ipv6Addr) -> Result<()> {
        self.write_blob(&addr.octets())
    }

    /// Write a 32-bit timestamp (seconds since the epoch, modulo 2^32).
    pub fn write_time(&mut self, secs: u32) -> Result<()> {
        self.write_u32(secs)
    }

    /// Write a domain name, compressed against every name written so far.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        self.write_name_inner(name, true)
    }

    /// Write a domain name without compression. Its labels can still be the
    /// target of later pointers.
    pub fn write_name_uncompressed(&mut self, name: &str) -> Result<()> {
        self.write_name_inner(name, false)
    }

    fn write_name_inner(&mut self, name: &str, compress: bool) -> Result<()> {
        self.ensure_space(0)?;

        let base = self.rdata_offset();
        let mut encoded = BytesMut::new();
        compress::write_name(&mut self.labels, &mut encoded, base, name, compress)?;

        if let Err(e) = self.ensure_space(encoded.len()) {
            self.labels.truncate(base);
            return Err(e);
        }
        self.record.extend_from_slice(&encoded);
        Ok(())
    }

    /// Write a character-string: a length byte followed by at most 255 bytes.
    pub fn write_text(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        let text = text.as_ref();
        if text.len() > u8::MAX as usize {
            return Err(PacketError::TextTooLong { len: text.len() });
        }
        self.ensure_space(1 + text.len())?;
        self.record.put_u8(text.len() as u8);
        self.record.extend_from_slice(text);
        Ok(())
    }

    /// Write raw bytes to the record data.
    pub fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_space(data.len())?;
        self.record.extend_from_slice(data);
        Ok(())
    }

    /// Decode hex text (whitespace is ignored) and write the bytes.
    pub fn write_hex_blob(&mut self, blob: &str) -> Result<()> {
        let cleaned: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let data = hex::decode(cleaned)?;
        self.write_blob(&data)
    }

    /// Set the transaction id.
    pub fn set_id(&mut self, id: u16) {
        header::write_u16(&mut self.content[..], 0, id);
    }

    /// Set the header flags.
    pub fn set_flags(&mut self, flags: DnsFlags) {
        header::write_u16(&mut self.content[..], 2, flags.to_u16());
    }

    /// Size of the committed message. Bytes of a pending record are not
    /// included, see [`pending_size`](Self::pending_size).
    #[inline]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Bytes the pending record will add once committed.
    pub fn pending_size(&self) -> usize {
        match self.pending {
            Some(_) => self.owner.len() + RR_FIXED_LEN + self.record.len(),
            None => 0,
        }
    }

    /// Whether a record is in progress.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The section of the latest record started.
    pub fn section(&self) -> Section {
        self.section
    }

    /// Raw 12 header bytes.
    pub fn header_bytes(&self) -> &[u8] {
        &self.content[..HEADER_LEN]
    }

    pub fn header(&self) -> Result<DnsHeader> {
        DnsHeader::decode(self.header_bytes())
    }

    /// Committed bytes after the header and question.
    pub fn records(&self) -> &[u8] {
        &self.content[self.start_of_records..]
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod writer_tests;
