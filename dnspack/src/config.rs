use std::net::{Ipv4Addr, Ipv6Addr};

use dnswriter::Section;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_CONFIG_PATH: &str = "dnspack.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[default]
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Logging level, logs go to stderr.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Records that would grow the message past this size are dropped and TC is set.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            max_size: default_max_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageConfig {
    #[serde(default)]
    pub id: u16,
    pub qname: String,
    #[serde(default = "default_qtype")]
    pub qtype: String,
    #[serde(default = "default_class")]
    pub qclass: String,
    #[serde(default)]
    pub response: bool,
    #[serde(default)]
    pub authoritative: bool,
    #[serde(default = "default_true")]
    pub recursion_desired: bool,
    #[serde(default)]
    pub recursion_available: bool,
    /// Full response code; values above 15 need an `[edns]` section.
    #[serde(default)]
    pub rcode: u16,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            id: 0,
            qname: "example.com.".into(),
            qtype: default_qtype(),
            qclass: default_class(),
            response: false,
            authoritative: false,
            recursion_desired: true,
            recursion_available: false,
            rcode: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EdnsConfig {
    #[serde(default = "default_udp_payload_size")]
    pub udp_payload_size: u16,
    /// DNSSEC OK bit.
    #[serde(default)]
    pub dnssec_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionConfig {
    #[default]
    Answer,
    Authority,
    Additional,
}

impl From<SectionConfig> for Section {
    fn from(value: SectionConfig) -> Self {
        match value {
            SectionConfig::Answer => Section::Answer,
            SectionConfig::Authority => Section::Authority,
            SectionConfig::Additional => Section::Additional,
        }
    }
}

/// Record data, keyed by record type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordDataConfig {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Cname(String),
    Ptr(String),
    Txt(String),
    Mx {
        priority: u16,
        host: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    /// Any other type, rdata given as hex.
    Raw {
        #[serde(rename = "type")]
        rtype: u16,
        hex: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordConfig {
    pub name: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default = "default_class")]
    pub class: String,
    #[serde(default)]
    pub section: SectionConfig,
    pub data: RecordDataConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    pub message: MessageConfig,
    pub edns: Option<EdnsConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RecordConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found")]
    NotFound,
    #[error("{0}")]
    Decode(String),
}

pub fn decode_from_str(content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Decode(e.message().into()))
}

fn decode_from_path(path: &str) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound)?;
    decode_from_str(&content)
}

/// Load the message description, writing a default one to `config_path` if it is missing.
pub fn load_config(config_path: &str) -> anyhow::Result<Config> {
    match decode_from_path(config_path) {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound) => create_default_config(config_path),
        Err(e) => Err(e.into()),
    }
}

pub fn create_default_config(config_path: &str) -> anyhow::Result<Config> {
    let cfg = Config::default();
    let toml_str = toml::to_string_pretty(&cfg)?;
    std::fs::write(config_path, toml_str)?;
    Ok(cfg)
}

fn default_max_size() -> usize {
    512
}

fn default_qtype() -> String {
    "A".into()
}

fn default_class() -> String {
    "IN".into()
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u32 {
    dnswriter::writer::DEFAULT_TTL
}

fn default_udp_payload_size() -> u16 {
    1232
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
