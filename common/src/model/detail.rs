//! Scalar values that may be missing.
//!
//! Scan formats disagree on how they say "no data": an absent attribute, an empty
//! string, or the literal `unknown`. All three collapse into [`Detail::Unknown`] at
//! the normalization boundary.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Detail {
    #[default]
    Unknown,
    Known(String),
}

impl Detail {
    /// Trims the input; empty and `unknown` (any case) become [`Detail::Unknown`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => Detail::Unknown,
            Some(s) if s.is_empty() || s.eq_ignore_ascii_case(UNKNOWN) => Detail::Unknown,
            Some(s) => Detail::Known(s.to_string()),
        }
    }

    pub fn known(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Detail::parse(Some(value.as_str()))
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Detail::Known(_))
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            Detail::Known(s) => Some(s),
            Detail::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.as_known().unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Detail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Number of alphanumeric runs: `"OpenSSL 1.0.1"` has four, `"1.0"` has two.
pub fn segments(value: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;
    for c in value.chars() {
        let alnum = c.is_alphanumeric();
        if alnum && !in_run {
            count += 1;
        }
        in_run = alnum;
    }
    count
}

/// Total order on known values by how much they say.
///
/// More segments wins, then more characters. On a full tie the lexicographically
/// smaller string ranks higher so the choice never depends on arrival order.
pub fn compare_detail(a: &str, b: &str) -> Ordering {
    segments(a)
        .cmp(&segments(b))
        .then_with(|| a.chars().count().cmp(&b.chars().count()))
        .then_with(|| b.cmp(a))
}

/// True when two distinct values only differ in spelling, not in detail.
pub fn is_detail_tie(a: &str, b: &str) -> bool {
    a != b && segments(a) == segments(b) && a.chars().count() == b.chars().count()
}
