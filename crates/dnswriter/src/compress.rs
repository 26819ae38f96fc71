use std::collections::HashMap;

use bytes::{BufMut, BytesMut};

use crate::{domain_name::split_labels, error::Result};

/// Highest offset a compression pointer can address (14 bits).
pub const MAX_POINTER_OFFSET: usize = 0x3FFF;

const POINTER_MASK: u16 = 0xC000;

/// Names and name suffixes already written to a message, keyed in lowercase,
/// with the offset they start at.
#[derive(Debug, Default, Clone)]
pub struct CompressionTable {
    names: HashMap<String, u16>,
}

impl CompressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of a previously recorded name. `name` must already be lowercase.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.names.get(name).copied()
    }

    /// Remember `name` at `offset`. Existing entries win, and offsets a pointer
    /// cannot reach are ignored. Returns whether the entry was added.
    pub fn insert(&mut self, name: &str, offset: usize) -> bool {
        if offset > MAX_POINTER_OFFSET || self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.to_string(), offset as u16);
        true
    }

    /// Forget every entry at or beyond `end`.
    pub fn truncate(&mut self, end: usize) {
        self.names.retain(|_, offset| (*offset as usize) < end);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Append the wire form of `name` to `out`, where `out[0]` sits at message
/// offset `base`. Returns the number of bytes written.
///
/// With `compress` set the longest suffix already in `table` is replaced by a
/// pointer. Every label written literally is recorded so later names can point
/// at it.
pub(crate) fn write_name(
    table: &mut CompressionTable,
    out: &mut BytesMut,
    base: usize,
    name: &str,
    compress: bool,
) -> Result<usize> {
    let labels = split_labels(name)?;
    let keys: Vec<String> = (0..labels.len())
        .map(|i| labels[i..].join(".").to_ascii_lowercase())
        .collect();

    let hit = if compress {
        keys.iter()
            .enumerate()
            .find_map(|(i, key)| table.lookup(key).map(|offset| (i, offset)))
    } else {
        None
    };
    let literal = hit.map_or(labels.len(), |(i, _)| i);

    let start = out.len();
    if hit.is_none() && !labels.is_empty() && base + start > MAX_POINTER_OFFSET {
        tracing::debug!(
            "name '{}' at offset {} is beyond compression range",
            name,
            base + start
        );
    }

    for (label, key) in labels[..literal].iter().zip(&keys) {
        table.insert(key, base + out.len());
        out.put_u8(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }

    match hit {
        Some((_, offset)) => out.put_u16(POINTER_MASK | offset),
        None => out.put_u8(0),
    }

    Ok(out.len() - start)
}
