//! Address classification
//!
//! IPAM systems hand out addresses in CIDR notation (`203.0.113.5/24`).
//! [`AddressPrefix`] is the validated form of such a value; once parsed it is
//! guaranteed to be either IPv4 or IPv6.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address family of a parsed prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddressFamily {
    /// Map the numeric family used by IPAM payloads (4 or 6)
    pub fn from_number(value: u8) -> Result<Self> {
        match value {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(Error::unsupported_family(format!(
                "family {} is neither IPv4 nor IPv6",
                other
            ))),
        }
    }

    /// Maximum prefix length for this family
    pub fn max_prefix_len(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

/// An IP address together with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressPrefix {
    addr: IpAddr,
    prefix_len: u8,
}

impl AddressPrefix {
    /// Build a prefix from its parts, validating the length for the family
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let family = family_of(&addr);
        if prefix_len > family.max_prefix_len() {
            return Err(Error::invalid_address(format!(
                "prefix length /{} exceeds {} for {}",
                prefix_len,
                family.max_prefix_len(),
                family
            )));
        }
        Ok(Self { addr, prefix_len })
    }

    /// The host address (not masked to the network)
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The prefix length as supplied by the IPAM system
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Address family of this prefix
    pub fn family(&self) -> AddressFamily {
        family_of(&self.addr)
    }
}

fn family_of(addr: &IpAddr) -> AddressFamily {
    match addr {
        IpAddr::V4(_) => AddressFamily::V4,
        IpAddr::V6(_) => AddressFamily::V6,
    }
}

impl FromStr for AddressPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| Error::invalid_address(format!("'{}' has no prefix length", s)))?;

        let addr: IpAddr = addr
            .parse()
            .map_err(|e| Error::invalid_address(format!("'{}': {}", s, e)))?;

        // u8 parsing alone would accept a leading '+'
        if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_address(format!(
                "'{}' has a malformed prefix length",
                s
            )));
        }
        let prefix_len: u8 = len
            .parse()
            .map_err(|_| Error::invalid_address(format!("'{}' has a malformed prefix length", s)))?;

        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl Serialize for AddressPrefix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressPrefix {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Classify CIDR text as IPv4 or IPv6
///
/// Fails with [`Error::InvalidAddress`] when the text is not a valid prefix.
pub fn classify(text: &str) -> Result<AddressFamily> {
    text.parse::<AddressPrefix>().map(|prefix| prefix.family())
}
