use std::net::IpAddr;

use serde::Serialize;

use nfusion_common::model::{
    Finding, FindingSet, FusedDataset, HostStatus, OsFingerprint, PortState, Protocol,
    ScriptResult, Service,
};
use nfusion_common::policy::BusinessFunctions;

/// Everything known about one host, with findings attached where they apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostDetail {
    pub ip: IpAddr,
    pub hostnames: Vec<String>,
    pub status: HostStatus,
    pub os: Option<OsFingerprint>,
    pub os_alternatives: Vec<OsFingerprint>,
    pub sources: Vec<String>,
    pub scripts: Vec<ScriptResult>,
    /// Findings about the host itself.
    pub findings: Vec<Finding>,
    pub ports: Vec<PortDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortDetail {
    pub port: u16,
    pub protocol: Protocol,
    pub state: PortState,
    pub service: Service,
    /// `other` unless the policy names a function for the port number.
    pub business_function: String,
    pub scripts: Vec<ScriptResult>,
    pub sources: Vec<String>,
    pub findings: Vec<Finding>,
}

pub fn detail(
    dataset: &FusedDataset,
    findings: &FindingSet,
    business: &BusinessFunctions,
) -> Vec<HostDetail> {
    dataset
        .hosts()
        .map(|host| HostDetail {
            ip: host.ip,
            hostnames: host.hostnames.iter().cloned().collect(),
            status: host.status,
            os: host.os.clone(),
            os_alternatives: host.os_alternatives.iter().cloned().collect(),
            sources: host.sources.iter().cloned().collect(),
            scripts: host.scripts.iter().cloned().collect(),
            findings: findings.host_level(host.ip).cloned().collect(),
            ports: host
                .ports()
                .map(|port| PortDetail {
                    port: port.key.number,
                    protocol: port.key.protocol,
                    state: port.state,
                    service: port.service.clone(),
                    business_function: business.function_of(port.key.number).to_string(),
                    scripts: port.scripts.iter().cloned().collect(),
                    sources: port.sources.iter().cloned().collect(),
                    findings: findings.for_port(host.ip, port.key).cloned().collect(),
                })
                .collect(),
        })
        .collect()
}
