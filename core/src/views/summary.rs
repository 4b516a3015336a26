use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::Serialize;

use nfusion_common::model::{Finding, FindingSet, FusedDataset, HostStatus, Protocol, Severity};
use nfusion_common::utils::ip::subnet_of;

/// One row per host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSummary {
    pub ip: IpAddr,
    pub subnet: String,
    pub hostnames: Vec<String>,
    pub os: String,
    pub status: HostStatus,
    pub total_ports: usize,
    pub open_ports: usize,
    pub tcp_ports: usize,
    pub udp_ports: usize,
    /// Distinct known service names on open ports.
    pub services: Vec<String>,
    pub finding_count: usize,
    pub top_severity: Option<Severity>,
    pub risk_score: f64,
    pub risk_level: Severity,
}

/// Sum of severity weights.
pub fn risk_score<'a>(findings: impl Iterator<Item = &'a Finding>) -> f64 {
    findings.map(|f| f.severity.weight()).sum()
}

pub fn summary(dataset: &FusedDataset, findings: &FindingSet) -> Vec<HostSummary> {
    dataset
        .hosts()
        .map(|host| {
            let count = |protocol: Protocol| host.ports().filter(|p| p.key.protocol == protocol).count();
            let services: BTreeSet<String> = host
                .open_ports()
                .filter_map(|p| p.service.name.as_known())
                .map(str::to_string)
                .collect();
            let score = risk_score(findings.for_host(host.ip));

            HostSummary {
                ip: host.ip,
                subnet: subnet_of(&host.ip),
                hostnames: host.hostnames.iter().cloned().collect(),
                os: host.os_name().to_string(),
                status: host.status,
                total_ports: host.ports.len(),
                open_ports: host.open_ports().count(),
                tcp_ports: count(Protocol::Tcp),
                udp_ports: count(Protocol::Udp),
                services: services.into_iter().collect(),
                finding_count: findings.for_host(host.ip).count(),
                top_severity: findings.for_host(host.ip).map(|f| f.severity).max(),
                risk_score: score,
                risk_level: Severity::from_score(score),
            }
        })
        .collect()
}
