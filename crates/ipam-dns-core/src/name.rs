//! Canonical DNS names
//!
//! The DNS management API only accepts fully qualified names, so every name
//! that leaves the planner ends with a dot. An empty name stays empty and
//! means "no name".

use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS name in canonical (trailing-dot) form, or empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DnsName(String);

impl DnsName {
    /// Normalize a name to canonical form
    ///
    /// Appends a trailing dot when absent. Empty input is passed through
    /// unchanged. Idempotent.
    pub fn normalize(name: &str) -> Self {
        if name.is_empty() || name.ends_with('.') {
            Self(name.to_string())
        } else {
            Self(format!("{}.", name))
        }
    }

    /// Whether this is the "no name" value
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name lies within `domain`
    ///
    /// The apex itself matches; otherwise the name must end with
    /// `.` + `domain`, so `routerexample.com.` is not inside `example.com.`.
    /// Comparison is ASCII case-insensitive.
    pub fn is_within(&self, domain: &DnsName) -> bool {
        if self.is_empty() || domain.is_empty() {
            return false;
        }

        let name = self.0.to_ascii_lowercase();
        let domain = domain.0.to_ascii_lowercase();
        if name == domain {
            return true;
        }

        // The root zone contains every name
        if domain == "." {
            return true;
        }

        name.ends_with(&format!(".{}", domain))
    }
}

impl From<String> for DnsName {
    fn from(name: String) -> Self {
        Self::normalize(&name)
    }
}

impl From<&str> for DnsName {
    fn from(name: &str) -> Self {
        Self::normalize(name)
    }
}

impl From<DnsName> for String {
    fn from(name: DnsName) -> Self {
        name.0
    }
}

impl AsRef<str> for DnsName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
