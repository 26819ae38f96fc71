//! Incremental DNS message writer.
//!
//! [`DnsPacketWriter`] serializes a message (RFC 1035, with RFC 2671 EDNS0)
//! record by record into a caller owned buffer, compressing names as it goes
//! and keeping the header counts in sync on every commit.

pub mod compress;
pub mod domain_name;
pub mod error;
pub mod header;
pub mod macros;
pub mod message;
pub mod rdata;
pub mod writer;

#[cfg(test)]
pub(crate) mod reader;

pub use domain_name::DomainName;
pub use error::{PacketError, Result};
pub use header::DnsHeader;
pub use message::{ClassType, DnsFlags, DnsOpcode, DnsResponseCode, RecordType, Section};
pub use rdata::{DnsWritable, EdnsOption, EdnsOptionCode, RecordData};
pub use writer::DnsPacketWriter;
