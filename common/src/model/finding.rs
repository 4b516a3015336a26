use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::port::PortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Contribution of one finding to a host risk score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Info => 0.0,
            Severity::Low => 1.0,
            Severity::Medium => 3.0,
            Severity::High => 5.0,
            Severity::Critical => 9.0,
        }
    }

    /// Maps an accumulated risk score back onto the severity scale.
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else if score >= 1.0 {
            Severity::Low
        } else {
            Severity::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    HighRiskPort,
    WeakCipher,
    OutdatedVersion,
    KnownVulnerable,
    CustomScriptFlag,
    AmbiguousMerge,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::HighRiskPort => "high-risk-port",
            FindingKind::WeakCipher => "weak-cipher",
            FindingKind::OutdatedVersion => "outdated-version",
            FindingKind::KnownVulnerable => "known-vulnerable",
            FindingKind::CustomScriptFlag => "custom-script-flag",
            FindingKind::AmbiguousMerge => "ambiguous-merge",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finding is attached to. `port: None` means the host itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FindingTarget {
    pub ip: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortKey>,
}

impl fmt::Display for FindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{} {}", self.ip, port),
            None => write!(f, "{}", self.ip),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Finding {
    pub target: FindingTarget,
    pub kind: FindingKind,
    pub severity: Severity,
    pub detail: String,
}

impl Finding {
    pub fn on_port(
        ip: IpAddr,
        port: PortKey,
        kind: FindingKind,
        severity: Severity,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            target: FindingTarget { ip, port: Some(port) },
            kind,
            severity,
            detail: detail.into(),
        }
    }

    pub fn on_host(ip: IpAddr, kind: FindingKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            target: FindingTarget { ip, port: None },
            kind,
            severity,
            detail: detail.into(),
        }
    }
}

/// Sorted, duplicate-free collection of findings.
///
/// Order is target (IP, then host before ports), kind, severity, detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FindingSet(Vec<Finding>);

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every finding for `ip`, host-level first.
    pub fn for_host(&self, ip: IpAddr) -> impl Iterator<Item = &Finding> {
        self.0.iter().filter(move |f| f.target.ip == ip)
    }

    pub fn host_level(&self, ip: IpAddr) -> impl Iterator<Item = &Finding> {
        self.for_host(ip).filter(|f| f.target.port.is_none())
    }

    pub fn for_port(&self, ip: IpAddr, port: PortKey) -> impl Iterator<Item = &Finding> {
        self.for_host(ip).filter(move |f| f.target.port == Some(port))
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.0.iter().map(|f| f.severity).max()
    }

    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.0.iter().any(|f| f.severity >= severity)
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary::from_findings(self.0.iter())
    }
}

impl FromIterator<Finding> for FindingSet {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        let mut findings: Vec<Finding> = iter.into_iter().collect();
        findings.sort();
        findings.dedup();
        FindingSet(findings)
    }
}

impl<'a> IntoIterator for &'a FindingSet {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeveritySummary {
    pub fn from_findings<'a>(findings: impl Iterator<Item = &'a Finding>) -> Self {
        findings.fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::Critical => acc.critical += 1,
                Severity::High => acc.high += 1,
                Severity::Medium => acc.medium += 1,
                Severity::Low => acc.low += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}
