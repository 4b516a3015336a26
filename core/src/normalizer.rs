//! # Record Normalizer
//!
//! Turns the loosely typed [`SourceScan`] records of one input file into canonical
//! [`Host`] values. After this point nothing downstream knows or cares which scan
//! format a fact came from.
//!
//! Normalization is a pure transform and never aborts a source: a host without a
//! usable address (or that did not decode at all) is skipped, a port with a bad
//! number is skipped, and everything else in the file survives. Each skip is reported as a [`SkippedRecord`].

use std::fmt;
use std::net::IpAddr;

use rayon::prelude::*;
use tracing::{debug, warn};

use nfusion_common::error::NormalizeError;
use nfusion_common::model::{
    Detail, Host, HostStatus, OsFingerprint, Port, PortKey, PortState, Protocol, ScriptResult,
    Service,
};
use nfusion_common::record::{RawHost, RawNumber, RawOs, RawPort, RawScript, RawService, SourceScan};
use nfusion_common::utils::ip;

use crate::resolver;

/// Canonical hosts of one source plus whatever had to be dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSource {
    pub source: String,
    pub command: Option<String>,
    pub hosts: Vec<Host>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub source: String,
    pub host_index: usize,
    /// Set when only one port of an otherwise valid host was dropped.
    pub port_index: Option<usize>,
    pub reason: NormalizeError,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port_index {
            Some(port) => write!(
                f,
                "{}: host #{} port #{}: {}",
                self.source, self.host_index, port, self.reason
            ),
            None => write!(f, "{}: host #{}: {}", self.source, self.host_index, self.reason),
        }
    }
}

/// Normalizes every source on the rayon pool, one task per source.
///
/// Output order matches input order.
pub fn normalize_all(scans: &[SourceScan]) -> Vec<NormalizedSource> {
    scans.par_iter().map(normalize_source).collect()
}

pub fn normalize_source(scan: &SourceScan) -> NormalizedSource {
    let mut hosts = Vec::with_capacity(scan.hosts.len());
    let mut skipped = Vec::new();

    for (host_index, raw) in scan.hosts.iter().enumerate() {
        match normalize_host(raw, &scan.source) {
            Ok((host, bad_ports)) => {
                for (port_index, reason) in bad_ports {
                    warn!(
                        "Skipping port #{port_index} of {} in {}: {reason}",
                        host.ip, scan.source
                    );
                    skipped.push(SkippedRecord {
                        source: scan.source.clone(),
                        host_index,
                        port_index: Some(port_index),
                        reason,
                    });
                }
                hosts.push(host);
            }
            Err(reason) => {
                warn!("Skipping host #{host_index} in {}: {reason}", scan.source);
                skipped.push(SkippedRecord {
                    source: scan.source.clone(),
                    host_index,
                    port_index: None,
                    reason,
                });
            }
        }
    }

    debug!(
        "{}: {} hosts normalized, {} records skipped",
        scan.source,
        hosts.len(),
        skipped.len()
    );

    NormalizedSource {
        source: scan.source.clone(),
        command: scan
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        hosts,
        skipped,
    }
}

/// Normalizes one host record.
///
/// Fails only when the address is unusable. Ports that fail are returned by index
/// next to the host instead of failing it.
pub fn normalize_host(
    raw: &RawHost,
    source: &str,
) -> Result<(Host, Vec<(usize, NormalizeError)>), NormalizeError> {
    if let Some(reason) = &raw.malformed {
        return Err(NormalizeError::Malformed(reason.clone()));
    }
    let mut host = Host::new(normalize_ip(raw.ip.as_deref())?);
    host.sources.insert(source.to_string());
    host.status = normalize_status(raw.status.as_deref());
    host.os = raw.os.as_ref().and_then(normalize_os);
    host.hostnames = raw
        .hostnames
        .iter()
        .filter_map(|h| normalize_hostname(h))
        .collect();
    host.scripts = raw.scripts.iter().filter_map(normalize_script).collect();

    let mut bad_ports = Vec::new();
    for (port_index, raw_port) in raw.ports.iter().enumerate() {
        match normalize_port(raw_port, source) {
            Ok(port) => resolver::insert_port(&mut host, port),
            Err(reason) => bad_ports.push((port_index, reason)),
        }
    }

    Ok((host, bad_ports))
}

pub fn normalize_port(raw: &RawPort, source: &str) -> Result<Port, NormalizeError> {
    if let Some(reason) = &raw.malformed {
        return Err(NormalizeError::Malformed(reason.clone()));
    }
    let number = normalize_port_number(raw.port.as_ref())?;
    let protocol = normalize_protocol(raw.protocol.as_deref())?;
    let state = normalize_state(raw.state.as_deref())?;

    let mut port = Port::new(PortKey::new(protocol, number), state);
    port.service = raw.service.as_ref().map(normalize_service).unwrap_or_default();
    port.scripts = raw.scripts.iter().filter_map(normalize_script).collect();
    port.sources.insert(source.to_string());
    Ok(port)
}

pub fn normalize_ip(raw: Option<&str>) -> Result<IpAddr, NormalizeError> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(NormalizeError::MissingIp)?;
    let bare = text
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(text);

    bare.parse::<IpAddr>()
        .map(ip::canonical)
        .map_err(|_| NormalizeError::InvalidIp(text.to_string()))
}

pub fn normalize_port_number(raw: Option<&RawNumber>) -> Result<u16, NormalizeError> {
    match raw {
        None => Err(NormalizeError::MissingPort),
        Some(RawNumber::Number(n)) => {
            u16::try_from(*n).map_err(|_| NormalizeError::InvalidPort(n.to_string()))
        }
        Some(RawNumber::Text(s)) if s.trim().is_empty() => Err(NormalizeError::MissingPort),
        Some(RawNumber::Text(s)) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| NormalizeError::InvalidPort(s.clone())),
    }
}

/// Absent protocol means TCP, the default of every scanner that omits it.
pub fn normalize_protocol(raw: Option<&str>) -> Result<Protocol, NormalizeError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Protocol::Tcp),
        Some(s) => s.parse().map_err(NormalizeError::InvalidProtocol),
    }
}

/// Ambiguous scanner states (`open|filtered`, `closed|filtered`, `unfiltered`)
/// count as filtered. An absent state means the format only lists open ports.
pub fn normalize_state(raw: Option<&str>) -> Result<PortState, NormalizeError> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(PortState::Open);
    };

    match text.to_ascii_lowercase().as_str() {
        "open" => Ok(PortState::Open),
        "filtered" | "open|filtered" | "closed|filtered" | "unfiltered" => Ok(PortState::Filtered),
        "closed" => Ok(PortState::Closed),
        _ => Err(NormalizeError::InvalidState(text.to_string())),
    }
}

pub fn normalize_status(raw: Option<&str>) -> HostStatus {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("up") => HostStatus::Up,
        Some("down") => HostStatus::Down,
        _ => HostStatus::Unknown,
    }
}

pub fn normalize_service(raw: &RawService) -> Service {
    Service {
        name: Detail::parse(raw.name.as_deref()),
        product: Detail::parse(raw.product.as_deref()),
        version: Detail::parse(raw.version.as_deref()),
        extra_info: Detail::parse(raw.extra_info.as_deref()),
        ..Default::default()
    }
}

/// Hostnames compare case-insensitively and without the root dot.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    (!name.is_empty()).then_some(name)
}

fn normalize_os(raw: &RawOs) -> Option<OsFingerprint> {
    let name = Detail::parse(raw.name.as_deref());
    let name = name.as_known()?;
    Some(OsFingerprint {
        name: name.to_string(),
        accuracy: raw
            .accuracy
            .as_ref()
            .and_then(RawNumber::as_i64)
            .unwrap_or(0)
            .clamp(0, 100) as u8,
    })
}

/// Script output keeps its words but not its layout; runs of whitespace collapse
/// to one space so the same result from two formats compares equal.
fn normalize_script(raw: &RawScript) -> Option<ScriptResult> {
    let id = raw.id.as_deref().map(str::trim).unwrap_or("");
    let output = raw
        .output
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    if id.is_empty() || output.is_empty() {
        debug!("Dropping script result without id or output: {:?}", raw.id);
        return None;
    }
    Some(ScriptResult::new(id, output))
}
