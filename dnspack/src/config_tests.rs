use std::net::Ipv4Addr;

use super::*;

#[test]
fn test_minimal_config_defaults() {
    let config = decode_from_str(
        r#"
        [message]
        qname = "example.com"
        "#,
    )
    .unwrap();

    assert_eq!(config.output, OutputConfig::default());
    assert_eq!(config.output.max_size, 512);
    assert_eq!(config.message.qtype, "A");
    assert_eq!(config.message.qclass, "IN");
    assert!(config.message.recursion_desired);
    assert!(config.edns.is_none());
    assert!(config.records.is_empty());
}

#[test]
fn test_records_decode() {
    let config = decode_from_str(
        r#"
        [output]
        log_level = "debug"
        max_size = 1232

        [message]
        id = 4660
        qname = "example.com"
        qtype = "MX"
        response = true

        [edns]
        dnssec_ok = true

        [[records]]
        name = "example.com"
        ttl = 300
        data = { mx = { priority = 10, host = "mail.example.com" } }

        [[records]]
        name = "mail.example.com"
        section = "additional"
        data = { a = "192.0.2.1" }

        [[records]]
        name = "example.com"
        section = "additional"
        data = { raw = { type = 65280, hex = "c0ffee" } }
        "#,
    )
    .unwrap();

    assert_eq!(config.output.log_level, LogLevel::Debug);
    assert_eq!(config.message.id, 4660);
    assert_eq!(config.edns.as_ref().unwrap().udp_payload_size, 1232);
    assert!(config.edns.as_ref().unwrap().dnssec_ok);

    assert_eq!(config.records.len(), 3);
    assert_eq!(config.records[0].ttl, 300);
    assert_eq!(config.records[0].section, SectionConfig::Answer);
    assert_eq!(
        config.records[0].data,
        RecordDataConfig::Mx {
            priority: 10,
            host: "mail.example.com".into()
        }
    );
    assert_eq!(config.records[1].ttl, 3600);
    assert_eq!(config.records[1].data, RecordDataConfig::A(Ipv4Addr::new(192, 0, 2, 1)));
    assert_eq!(Section::from(config.records[2].section), Section::Additional);
}

#[test]
fn test_decode_error() {
    let err = decode_from_str("[message]\nid = \"nope\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Decode(_)));
}

#[test]
fn test_load_config_writes_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dnspack.toml");
    let path = path.to_str().unwrap();

    let created = load_config(path).unwrap();
    assert_eq!(created, Config::default());

    let loaded = load_config(path).unwrap();
    assert_eq!(loaded, created);
}
