use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use super::detail::UNKNOWN;
use super::port::{Port, PortKey, ScriptResult};

/// Ordered so that `max` keeps the most informative status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    #[default]
    Unknown,
    Down,
    Up,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Unknown => "unknown",
            HostStatus::Down => "down",
            HostStatus::Up => "up",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OsFingerprint {
    pub name: String,
    /// Match confidence, 0..=100.
    pub accuracy: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub ip: IpAddr,
    /// Every hostname any source reported; aliases accumulate.
    pub hostnames: BTreeSet<String>,
    pub status: HostStatus,
    pub os: Option<OsFingerprint>,
    /// Fingerprints that lost to [`Host::os`]: the best one per name, never the
    /// kept name.
    pub os_alternatives: BTreeSet<OsFingerprint>,
    pub ports: BTreeMap<PortKey, Port>,
    /// Host-level script output.
    pub scripts: BTreeSet<ScriptResult>,
    pub sources: BTreeSet<String>,
}

impl Host {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            hostnames: BTreeSet::new(),
            status: HostStatus::Unknown,
            os: None,
            os_alternatives: BTreeSet::new(),
            ports: BTreeMap::new(),
            scripts: BTreeSet::new(),
            sources: BTreeSet::new(),
        }
    }

    /// Ports ordered by protocol, then number.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn port(&self, key: &PortKey) -> Option<&Port> {
        self.ports.get(key)
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports().filter(|p| p.is_open())
    }

    pub fn os_name(&self) -> &str {
        self.os.as_ref().map(|os| os.name.as_str()).unwrap_or(UNKNOWN)
    }

    /// First hostname in sorted order, used where a single label is needed.
    pub fn primary_hostname(&self) -> Option<&str> {
        self.hostnames.iter().next().map(String::as_str)
    }
}
