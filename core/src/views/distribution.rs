use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use serde::Serialize;

use nfusion_common::model::{FusedDataset, Protocol};

/// How often one port shows up across the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortDistribution {
    pub port: u16,
    pub protocol: Protocol,
    /// Hosts reporting the port in any state.
    pub occurrences: usize,
    pub open: usize,
    pub hosts: Vec<IpAddr>,
    /// Most frequent known service name; ties go to the alphabetically first.
    pub common_service: Option<String>,
}

#[derive(Default)]
struct Tally {
    open: usize,
    hosts: BTreeSet<IpAddr>,
    names: BTreeMap<String, usize>,
}

/// Rows ordered by port number, then protocol.
pub fn port_distribution(dataset: &FusedDataset) -> Vec<PortDistribution> {
    let mut tallies: BTreeMap<(u16, Protocol), Tally> = BTreeMap::new();

    for host in dataset.hosts() {
        for port in host.ports() {
            let tally = tallies.entry((port.key.number, port.key.protocol)).or_default();
            tally.hosts.insert(host.ip);
            if port.is_open() {
                tally.open += 1;
            }
            if let Some(name) = port.service.name.as_known() {
                *tally.names.entry(name.to_string()).or_default() += 1;
            }
        }
    }

    tallies
        .into_iter()
        .map(|((port, protocol), tally)| {
            // max_by_key keeps the last maximum; reverse so ties pick the first name.
            let common_service = tally
                .names
                .iter()
                .rev()
                .max_by_key(|(_, count)| **count)
                .map(|(name, _)| name.clone());

            PortDistribution {
                port,
                protocol,
                occurrences: tally.hosts.len(),
                open: tally.open,
                hosts: tally.hosts.into_iter().collect(),
                common_service,
            }
        })
        .collect()
}
