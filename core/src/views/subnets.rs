use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Serialize;

use nfusion_common::model::{FindingSet, FusedDataset, Severity};
use nfusion_common::utils::ip::network_of;

/// Roll-up of one /24 (IPv4) or /64 (IPv6).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubnetSummary {
    pub subnet: String,
    pub host_count: usize,
    pub first: IpAddr,
    pub last: IpAddr,
    pub open_ports: usize,
    pub top_severity: Option<Severity>,
}

struct Group {
    hosts: Vec<IpAddr>,
    open_ports: usize,
    top_severity: Option<Severity>,
}

/// Subnets in network address order.
pub fn subnets(dataset: &FusedDataset, findings: &FindingSet) -> Vec<SubnetSummary> {
    let mut groups: BTreeMap<(IpAddr, u8), Group> = BTreeMap::new();

    for host in dataset.hosts() {
        let group = groups.entry(network_of(&host.ip)).or_insert_with(|| Group {
            hosts: Vec::new(),
            open_ports: 0,
            top_severity: None,
        });
        group.hosts.push(host.ip);
        group.open_ports += host.open_ports().count();
        let severity = findings.for_host(host.ip).map(|f| f.severity).max();
        group.top_severity = group.top_severity.max(severity);
    }

    groups
        .into_iter()
        .filter_map(|((network, prefix), group)| {
            // hosts arrive in IP order
            let first = *group.hosts.first()?;
            let last = *group.hosts.last()?;
            Some(SubnetSummary {
                subnet: format!("{network}/{prefix}"),
                host_count: group.hosts.len(),
                first,
                last,
                open_ports: group.open_ports,
                top_severity: group.top_severity,
            })
        })
        .collect()
}
