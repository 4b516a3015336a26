//! # Fused Dataset
//!
//! The root of a fusion run. Only the fusion engine constructs one; afterwards
//! it exposes nothing but shared references, so classification and projection
//! cannot alter what was fused.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::host::Host;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetMetadata {
    /// Number of sources folded in, duplicates included.
    pub source_count: usize,
    /// Distinct provenance tags.
    pub sources: BTreeSet<String>,
    /// Distinct scan command lines recorded by the sources.
    pub commands: BTreeSet<String>,
    pub generated_at: DateTime<Utc>,
    pub host_count: usize,
    pub port_count: usize,
    /// Ports whose service name is known.
    pub service_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusedDataset {
    hosts: BTreeMap<IpAddr, Host>,
    metadata: DatasetMetadata,
}

impl FusedDataset {
    pub fn new(
        hosts: BTreeMap<IpAddr, Host>,
        source_count: usize,
        commands: BTreeSet<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let sources: BTreeSet<String> = hosts
            .values()
            .flat_map(|h| h.sources.iter().cloned())
            .collect();
        let port_count = hosts.values().map(|h| h.ports.len()).sum();
        let service_count = hosts
            .values()
            .flat_map(|h| h.ports())
            .filter(|p| p.service.name.is_known())
            .count();

        let metadata = DatasetMetadata {
            source_count,
            sources,
            commands,
            generated_at,
            host_count: hosts.len(),
            port_count,
            service_count,
        };

        Self { hosts, metadata }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), 0, BTreeSet::new(), Utc::now())
    }

    /// Hosts in ascending IP order (IPv4 before IPv6).
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn host(&self, ip: &IpAddr) -> Option<&Host> {
        self.hosts.get(ip)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
}
