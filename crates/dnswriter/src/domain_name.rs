use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use idna::AsciiDenyList;

use crate::error::{PacketError, Result};

/// Longest label allowed by RFC 1035.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest name allowed on the wire, length bytes and root included.
pub const MAX_NAME_LEN: usize = 255;

/// Split a dotted name into its labels, validating it against RFC 1035.
///
/// The trailing dot is optional; `"."` and `""` are the root and yield no labels.
pub(crate) fn split_labels(name: &str) -> Result<Vec<&str>> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let invalid = |reason| PacketError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut wire_len = 1; // root
    let mut labels = Vec::new();
    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid("label exceeds 63 bytes"));
        }
        wire_len += 1 + label.len();
        labels.push(label);
    }

    if wire_len > MAX_NAME_LEN {
        return Err(invalid("name exceeds 255 bytes"));
    }

    Ok(labels)
}

/// A wrapper type for domain names.
/// The input is stored as lowercase to allow case-insensitive comparisons.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct DomainName(Arc<str>);

impl DomainName {
    /// The root name.
    pub fn root() -> Self {
        Self(Arc::from("."))
    }

    /// Create a new DomainName from an ASCII string.
    /// The domain name is validated according to RFC 1035.
    ///
    /// NOTE: This function does not support Unicode domain names and should only be called with ASCII input.
    pub fn from_ascii(s: impl AsRef<str>) -> Result<Self> {
        let input = s.as_ref().trim();
        let labels = split_labels(input)?;

        if labels.is_empty() {
            return Ok(Self::root());
        }

        Ok(Self(Arc::from(labels.join(".").to_ascii_lowercase())))
    }

    /// Create a new DomainName from a user input string.
    /// This function supports Unicode domain names and performs IDNA conversion.
    pub fn from_user(s: impl AsRef<str>) -> Result<Self> {
        let input = s.as_ref().trim();

        let name = input.strip_suffix('.').unwrap_or(input);
        if name.is_empty() {
            return Ok(Self::root());
        }

        // IDNA to ASCII
        let ascii = idna::domain_to_ascii_cow(name.as_bytes(), AsciiDenyList::URL).map_err(|_| {
            PacketError::InvalidName {
                name: input.to_string(),
                reason: "invalid IDNA domain",
            }
        })?;

        Self::from_ascii(&*ascii)
    }

    pub fn is_root(&self) -> bool {
        &*self.0 == "."
    }

    /// Labels from the leftmost one to the top level; empty for the root.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|l| !l.is_empty())
    }

    /// Get the string representation of the DomainName.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for DomainName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for DomainName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_name_creation() {
        let dn = DomainName::from_ascii("Example.com.").unwrap();
        assert_eq!(dn.as_str(), "example.com");

        let dn2 = DomainName::from_ascii("sub.domain.example.com").unwrap();
        assert_eq!(dn2.as_str(), "sub.domain.example.com");
        assert_eq!(dn2.labels().count(), 4);

        assert!(DomainName::from_ascii("a".repeat(256)).is_err());
        assert!(DomainName::from_ascii("label..example.com").is_err());
        assert!(DomainName::from_ascii("a".repeat(64) + ".com").is_err());
    }

    #[test]
    fn test_root() {
        assert!(DomainName::from_ascii(".").unwrap().is_root());
        assert!(DomainName::from_ascii("").unwrap().is_root());
        assert!(DomainName::from_user(".").unwrap().is_root());
        assert_eq!(DomainName::root().labels().count(), 0);
    }

    #[test]
    fn test_idna() {
        let dn = DomainName::from_user("bücher.example").unwrap();
        assert_eq!(dn.as_str(), "xn--bcher-kva.example");
    }

    #[test]
    fn test_split_labels_limits() {
        assert_eq!(split_labels("www.example.com.").unwrap(), vec!["www", "example", "com"]);
        assert!(split_labels(".").unwrap().is_empty());

        // 4 labels of 63 bytes: 4 * 64 + 1 = 257 wire bytes.
        let long = vec!["a".repeat(63); 4].join(".");
        assert!(matches!(
            split_labels(&long),
            Err(PacketError::InvalidName { reason: "name exceeds 255 bytes", .. })
        ));

        // 3 * 64 + 62 + 1 = 255 wire bytes exactly.
        let max = format!("{}.{}", vec!["a".repeat(63); 3].join("."), "b".repeat(61));
        assert!(split_labels(&max).is_ok());
    }
}
