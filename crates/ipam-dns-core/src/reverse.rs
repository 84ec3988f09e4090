//! Reverse zone resolution
//!
//! Maps an address to the reverse zone that holds its PTR record and to the
//! PTR owner name itself.
//!
//! The zone boundaries are fixed policy, not derived from the prefix length
//! the IPAM system reports:
//!
//! - IPv4 zones are always /24 (`c.b.a.in-addr.arpa.`)
//! - IPv6 zones cover the first `ipv6_zone_nibbles` nibbles (8 by default,
//!   i.e. a /32)

use crate::address::AddressPrefix;
use crate::error::{Error, Result};
use crate::name::DnsName;
use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Default number of leading nibbles in an IPv6 reverse zone (/32)
pub const DEFAULT_IPV6_ZONE_NIBBLES: usize = 8;

/// Nibbles in a fully expanded IPv6 address
const IPV6_NIBBLES: usize = 32;

const IPV4_REVERSE_SUFFIX: &str = "in-addr.arpa.";
const IPV6_REVERSE_SUFFIX: &str = "ip6.arpa.";

/// Reverse zone and PTR owner name of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseTarget {
    /// Reverse zone holding the record
    pub zone: DnsName,
    /// PTR owner name
    pub record: DnsName,
}

/// Computes [`ReverseTarget`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseZoneResolver {
    ipv6_zone_nibbles: usize,
}

impl ReverseZoneResolver {
    /// Create a resolver with a custom IPv6 zone size
    ///
    /// `ipv6_zone_nibbles` must be within `1..=32`.
    pub fn new(ipv6_zone_nibbles: usize) -> Result<Self> {
        if !(1..=IPV6_NIBBLES).contains(&ipv6_zone_nibbles) {
            return Err(Error::config(format!(
                "IPv6 reverse zone must span 1 to {} nibbles, got {}",
                IPV6_NIBBLES, ipv6_zone_nibbles
            )));
        }
        Ok(Self { ipv6_zone_nibbles })
    }

    /// Number of leading nibbles in IPv6 reverse zones
    pub fn ipv6_zone_nibbles(&self) -> usize {
        self.ipv6_zone_nibbles
    }

    /// Resolve the reverse zone and PTR owner name for an address
    ///
    /// The prefix length is ignored; see the module docs.
    pub fn resolve(&self, prefix: &AddressPrefix) -> ReverseTarget {
        match prefix.addr() {
            IpAddr::V4(addr) => resolve_v4(addr),
            IpAddr::V6(addr) => self.resolve_v6(addr),
        }
    }

    fn resolve_v6(&self, addr: Ipv6Addr) -> ReverseTarget {
        let nibbles = expand_nibbles(addr);

        ReverseTarget {
            zone: DnsName::normalize(&reversed_labels(
                &nibbles[..self.ipv6_zone_nibbles],
                IPV6_REVERSE_SUFFIX,
            )),
            record: DnsName::normalize(&reversed_labels(&nibbles, IPV6_REVERSE_SUFFIX)),
        }
    }
}

impl Default for ReverseZoneResolver {
    fn default() -> Self {
        Self {
            ipv6_zone_nibbles: DEFAULT_IPV6_ZONE_NIBBLES,
        }
    }
}

fn resolve_v4(addr: Ipv4Addr) -> ReverseTarget {
    let [o1, o2, o3, o4] = addr.octets();

    ReverseTarget {
        zone: DnsName::normalize(&format!("{}.{}.{}.{}", o3, o2, o1, IPV4_REVERSE_SUFFIX)),
        record: DnsName::normalize(&format!(
            "{}.{}.{}.{}.{}",
            o4, o3, o2, o1, IPV4_REVERSE_SUFFIX
        )),
    }
}

/// The 32 lowercase hex nibbles of an address, most significant first
fn expand_nibbles(addr: Ipv6Addr) -> Vec<char> {
    let mut hex = String::with_capacity(IPV6_NIBBLES);
    for byte in addr.octets() {
        // Writing to a String cannot fail
        let _ = write!(hex, "{:02x}", byte);
    }
    hex.chars().collect()
}

fn reversed_labels(nibbles: &[char], suffix: &str) -> String {
    let mut out = String::with_capacity(nibbles.len() * 2 + suffix.len());
    for nibble in nibbles.iter().rev() {
        out.push(*nibble);
        out.push('.');
    }
    out.push_str(suffix);
    out
}
