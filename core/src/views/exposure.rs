use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Serialize;

use nfusion_common::model::{FusedDataset, PortKey};
use nfusion_common::policy::BusinessFunctions;

/// Hosts offering one service on open ports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceExposure {
    pub service: String,
    pub host_count: usize,
    pub hosts: Vec<ExposedHost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposedHost {
    pub ip: IpAddr,
    pub ports: Vec<ExposedPort>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposedPort {
    #[serde(flatten)]
    pub key: PortKey,
    pub business_function: String,
}

/// Grouped by service name (`unknown` included), names ascending.
pub fn service_exposure(
    dataset: &FusedDataset,
    business: &BusinessFunctions,
) -> Vec<ServiceExposure> {
    let mut groups: BTreeMap<&str, BTreeMap<IpAddr, Vec<ExposedPort>>> = BTreeMap::new();

    for host in dataset.hosts() {
        for port in host.open_ports() {
            groups
                .entry(port.service.name.as_str())
                .or_default()
                .entry(host.ip)
                .or_default()
                .push(ExposedPort {
                    key: port.key,
                    business_function: business.function_of(port.key.number).to_string(),
                });
        }
    }

    groups
        .into_iter()
        .map(|(service, hosts)| ServiceExposure {
            service: service.to_string(),
            host_count: hosts.len(),
            hosts: hosts
                .into_iter()
                .map(|(ip, ports)| ExposedHost { ip, ports })
                .collect(),
        })
        .collect()
}
