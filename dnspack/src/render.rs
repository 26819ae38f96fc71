use anyhow::Context;
use bytes::BytesMut;
use dnswriter::{
    ClassType, DnsFlags, DnsOpcode, DnsPacketWriter, DnsResponseCode, DomainName, RecordData, RecordType,
};

use crate::config::{Config, RecordDataConfig, RecordConfig};

/// Size of an OPT record without options.
const OPT_LEN: usize = 11;

/// DNSSEC OK bit in the OPT flags.
const DO_BIT: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub size: usize,
    pub records: usize,
    pub truncated: bool,
}

/// Parse a record type mnemonic (`"AAAA"`), `TYPEnnn` or a bare number.
pub fn parse_record_type(s: &str) -> anyhow::Result<RecordType> {
    if let Some(rtype) = RecordType::from_mnemonic(s) {
        return Ok(rtype);
    }
    let digits = s
        .get(..4)
        .filter(|p| p.eq_ignore_ascii_case("type"))
        .map_or(s, |_| &s[4..]);
    let code: u16 = digits.parse().with_context(|| format!("unknown record type '{}'", s))?;
    Ok(RecordType::from(code))
}

/// Parse a class mnemonic (`"IN"`), `CLASSnnn` or a bare number.
pub fn parse_class(s: &str) -> anyhow::Result<ClassType> {
    if let Some(class) = ClassType::from_mnemonic(s) {
        return Ok(class);
    }
    let digits = s
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("class"))
        .map_or(s, |_| &s[5..]);
    let code: u16 = digits.parse().with_context(|| format!("unknown class '{}'", s))?;
    Ok(ClassType::from(code))
}

fn name(s: &str) -> anyhow::Result<DomainName> {
    DomainName::from_user(s).with_context(|| format!("invalid domain name '{}'", s))
}

fn record_data(data: &RecordDataConfig) -> anyhow::Result<(RecordType, RecordData)> {
    Ok(match data {
        RecordDataConfig::A(addr) => (RecordType::A, RecordData::Ipv4(*addr)),
        RecordDataConfig::Aaaa(addr) => (RecordType::AAAA, RecordData::Ipv6(*addr)),
        RecordDataConfig::Ns(host) => (RecordType::NS, RecordData::DomainName(name(host)?)),
        RecordDataConfig::Cname(host) => (RecordType::CNAME, RecordData::DomainName(name(host)?)),
        RecordDataConfig::Ptr(host) => (RecordType::PTR, RecordData::DomainName(name(host)?)),
        RecordDataConfig::Txt(text) => (RecordType::TXT, RecordData::Text(text.as_str().into())),
        RecordDataConfig::Mx { priority, host } => (
            RecordType::MX,
            RecordData::MX {
                priority: *priority,
                host: name(host)?,
            },
        ),
        RecordDataConfig::Srv {
            priority,
            weight,
            port,
            target,
        } => (
            RecordType::SRV,
            RecordData::SRV {
                priority: *priority,
                weight: *weight,
                port: *port,
                target: name(target)?,
            },
        ),
        RecordDataConfig::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => (
            RecordType::SOA,
            RecordData::SOA {
                mname: name(mname)?,
                rname: name(rname)?,
                serial: *serial,
                refresh: *refresh,
                retry: *retry,
                expire: *expire,
                minimum: *minimum,
            },
        ),
        RecordDataConfig::Raw { rtype, hex } => {
            let data = hex::decode(hex).with_context(|| format!("invalid hex rdata '{}'", hex))?;
            (RecordType::from(*rtype), RecordData::Raw(data))
        }
    })
}

fn add_record(writer: &mut DnsPacketWriter<'_>, record: &RecordConfig) -> anyhow::Result<()> {
    let (rtype, data) = record_data(&record.data)?;
    let owner = name(&record.name)?;
    writer.add_record(
        &owner,
        rtype,
        record.ttl,
        parse_class(&record.class)?,
        record.section.into(),
        &data,
    )?;
    writer.commit()?;
    Ok(())
}

/// Build the message described by `config` into `buf`.
///
/// Records are added in order. The first one that takes the message past the
/// configured size is rolled back, TC is set and the remaining records are skipped.
pub fn render(config: &Config, buf: &mut BytesMut) -> anyhow::Result<RenderSummary> {
    let message = &config.message;
    let qname = name(&message.qname)?;
    let mut writer = DnsPacketWriter::new(
        buf,
        &qname,
        parse_record_type(&message.qtype)?,
        parse_class(&message.qclass)?,
    )?;

    let mut flags = DnsFlags::default();
    flags.response = message.response;
    flags.opcode = DnsOpcode::Query;
    flags.authorative_answer = message.authoritative;
    flags.recursion_desired = message.recursion_desired;
    flags.recursion_available = message.recursion_available;
    let rcode = DnsResponseCode::try_from(message.rcode)
        .map_err(|_| anyhow::anyhow!("unknown response code {}", message.rcode))?;
    let extended_rcode = flags.set_response_code(rcode);
    if extended_rcode != 0 && config.edns.is_none() {
        anyhow::bail!("response code {} needs an [edns] section", message.rcode);
    }

    // keep room for the OPT record
    let limit = match config.edns {
        Some(_) => config.output.max_size.saturating_sub(OPT_LEN),
        None => config.output.max_size,
    };

    let mut written = 0;
    for (i, record) in config.records.iter().enumerate() {
        add_record(&mut writer, record).with_context(|| format!("record #{} ({})", i + 1, record.name))?;

        if writer.size() > limit {
            writer.rollback();
            flags.truncated = true;
            tracing::warn!(
                "message exceeds {} bytes, dropping record #{} and {} more",
                limit,
                i + 1,
                config.records.len() - i - 1
            );
            break;
        }
        written += 1;
        tracing::debug!("added record #{} ({}), size={}", i + 1, record.name, writer.size());
    }

    if let Some(edns) = &config.edns {
        let z = if edns.dnssec_ok { DO_BIT } else { 0 };
        writer.add_opt(edns.udp_payload_size, extended_rcode, z)?;
    }

    writer.set_id(message.id);
    writer.set_flags(flags);
    let size = writer.finish()?;

    Ok(RenderSummary {
        size,
        records: written,
        truncated: flags.truncated,
    })
}
