//! Minimal wire reader used to check produced messages in tests.

use std::collections::HashSet;

use anyhow::{bail, ensure};

use crate::{header::DnsHeader, message::Section};

/// A reader for DNS messages that allows reading various components
pub struct DnsMessageReader<'a> {
    /// Internal buffer containing the DNS message.
    buffer: &'a [u8],
    /// Position in bytes.
    position: usize,
}

impl<'a> DnsMessageReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    #[inline]
    fn need(&self, need: usize, what: &str) -> anyhow::Result<()> {
        let rem = self.buffer.len() - self.position;
        ensure!(
            need <= rem,
            "buffer underflow at pos {} while reading {}: need {} bytes, have {}",
            self.position,
            what,
            need,
            rem
        );
        Ok(())
    }

    pub fn read_u16(&mut self) -> anyhow::Result<u16> {
        self.need(2, "u16")?;
        let word = u16::from_be_bytes([self.buffer[self.position], self.buffer[self.position + 1]]);
        self.position += 2;
        Ok(word)
    }

    pub fn read_u32(&mut self) -> anyhow::Result<u32> {
        let high = self.read_u16()? as u32;
        let low = self.read_u16()? as u32;
        Ok((high << 16) | low)
    }

    /// Read a possibly compressed name, returned as written without trailing dot.
    pub fn read_qname(&mut self) -> anyhow::Result<String> {
        let mut pos = self.position;
        let mut jumped = false;
        let mut seen = HashSet::new();
        let mut labels: Vec<String> = Vec::new();

        loop {
            ensure!(pos < self.buffer.len(), "qname out of bounds at pos {}", pos);
            ensure!(seen.insert(pos), "qname compression pointer loop at pos {}", pos);

            let length = self.buffer[pos];
            if length & 0xC0 == 0xC0 {
                ensure!(pos + 2 <= self.buffer.len(), "truncated compression pointer");
                let offset = (((length as usize) & 0x3F) << 8) | self.buffer[pos + 1] as usize;
                // pointers must go backwards
                ensure!(offset < pos, "forward compression pointer {} at pos {}", offset, pos);
                if !jumped {
                    self.position = pos + 2;
                }
                pos = offset;
                jumped = true;
            } else if length == 0 {
                if !jumped {
                    self.position = pos + 1;
                }
                break;
            } else if length & 0xC0 != 0 {
                bail!("reserved label type 0x{:02x} at pos {}", length, pos);
            } else {
                let end = pos + 1 + length as usize;
                ensure!(end <= self.buffer.len(), "label overruns buffer at pos {}", pos);
                labels.push(String::from_utf8_lossy(&self.buffer[pos + 1..end]).into_owned());
                pos = end;
                if !jumped {
                    self.position = pos;
                }
            }
        }

        Ok(labels.join("."))
    }

    pub fn read_bytes(&mut self, length: usize) -> anyhow::Result<&'a [u8]> {
        self.need(length, "raw bytes")?;
        let data = &self.buffer[self.position..self.position + length];
        self.position += length;
        Ok(data)
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub section: Section,
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub header: DnsHeader,
    pub qname: String,
    pub qtype: u16,
    pub qclass: u16,
    pub records: Vec<ParsedRecord>,
}

impl ParsedMessage {
    pub fn section(&self, section: Section) -> impl Iterator<Item = &ParsedRecord> {
        self.records.iter().filter(move |r| r.section == section)
    }
}

/// Decode a message with exactly one question.
pub fn decode(data: &[u8]) -> anyhow::Result<ParsedMessage> {
    let header = DnsHeader::decode(data)?;
    ensure!(header.question_count == 1, "expected one question");

    let mut reader = DnsMessageReader::new(data);
    reader.read_bytes(12)?;
    let qname = reader.read_qname()?;
    let qtype = reader.read_u16()?;
    let qclass = reader.read_u16()?;

    let mut records = Vec::new();
    for section in [Section::Answer, Section::Authority, Section::Additional] {
        for _ in 0..header.count(section) {
            let name = reader.read_qname()?;
            let rtype = reader.read_u16()?;
            let class = reader.read_u16()?;
            let ttl = reader.read_u32()?;
            let rdlen = reader.read_u16()? as usize;
            let rdata = reader.read_bytes(rdlen)?.to_vec();
            records.push(ParsedRecord {
                section,
                name,
                rtype,
                class,
                ttl,
                rdata,
            });
        }
    }
    ensure!(reader.position() == data.len(), "trailing bytes after last record");

    Ok(ParsedMessage {
        header,
        qname,
        qtype,
        qclass,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_qname_with_compression() {
        let mut data = vec![7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0];
        data.extend_from_slice(&[3, b'w', b'w', b'w', 0xC0, 0x00]);

        let mut reader = DnsMessageReader::new(&data);
        assert_eq!(reader.read_qname().unwrap(), "example.com");
        assert_eq!(reader.read_qname().unwrap(), "www.example.com");
        assert_eq!(reader.position(), data.len());
    }

    #[test]
    fn test_read_qname_compression_loop_detection() {
        let data = vec![0xC0, 0x00];
        let mut reader = DnsMessageReader::new(&data);
        assert!(reader.read_qname().is_err());
    }

    #[test]
    fn test_buffer_underflow_errors() {
        let data = [1, 2];
        let mut reader = DnsMessageReader::new(&data);
        assert!(reader.read_u32().is_err());
    }
}
