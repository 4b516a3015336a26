use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(other.to_string()),
        }
    }
}

/// Ordered from least to most exposed, so `max` is the escalation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Closed,
    Filtered,
    Open,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
            PortState::Open => "open",
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a port under a host. Orders by protocol, then number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PortKey {
    pub protocol: Protocol,
    pub number: u16,
}

impl PortKey {
    pub fn new(protocol: Protocol, number: u16) -> Self {
        Self { protocol, number }
    }

    pub fn tcp(number: u16) -> Self {
        Self::new(Protocol::Tcp, number)
    }

    pub fn udp(number: u16) -> Self {
        Self::new(Protocol::Udp, number)
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

/// Output of one scan script. Identity is the exact `(id, output)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScriptResult {
    pub id: String,
    pub output: String,
}

impl ScriptResult {
    pub fn new(id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub key: PortKey,
    pub state: PortState,
    pub service: Service,
    pub scripts: BTreeSet<ScriptResult>,
    /// Provenance tags of every source that reported this port.
    pub sources: BTreeSet<String>,
}

impl Port {
    pub fn new(key: PortKey, state: PortState) -> Self {
        Self {
            key,
            state,
            service: Service::default(),
            scripts: BTreeSet::new(),
            sources: BTreeSet::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!(" TCP ".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert_eq!("udp".parse::<Protocol>(), Ok(Protocol::Udp));
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn state_order_is_escalation_order() {
        assert!(PortState::Open > PortState::Filtered);
        assert!(PortState::Filtered > PortState::Closed);
        assert_eq!(PortState::Filtered.max(PortState::Open), PortState::Open);
    }

    #[test]
    fn keys_sort_by_protocol_then_number() {
        let mut keys = vec![PortKey::udp(53), PortKey::tcp(443), PortKey::tcp(22)];
        keys.sort();
        assert_eq!(keys, vec![PortKey::tcp(22), PortKey::tcp(443), PortKey::udp(53)]);
        assert_eq!(PortKey::tcp(443).to_string(), "443/tcp");
    }
}
