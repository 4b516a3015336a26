//! # Fusion Orchestrator
//!
//! Folds any number of normalized sources into one [`FusedDataset`]. The engine
//! keeps one merged [`Host`] per address; a first sighting is inserted as is and
//! every later sighting is folded in through [`Merge`].
//!
//! Two drivers are offered. [`fuse`] is the single-writer loop. [`fuse_parallel`]
//! builds one partial engine per source on the rayon pool and reduces them
//! pairwise, which is only correct because merging is associative and
//! commutative. Both yield the same hosts.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use nfusion_common::model::{FusedDataset, Host};

use crate::normalizer::NormalizedSource;
use crate::resolver::Merge;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FusionStats {
    pub files_processed: usize,
    pub input_hosts: usize,
    pub input_ports: usize,
    pub unique_ips: usize,
    pub fused_ports: usize,
    /// Port records absorbed into an existing port.
    pub duplicate_ports_removed: usize,
    /// Script results (host and port level) left after fusion.
    pub scripts: usize,
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionResult {
    pub dataset: FusedDataset,
    pub stats: FusionStats,
}

/// Mutable state of a fusion run. Consumed by [`FusionEngine::finish`].
#[derive(Debug, Default)]
pub struct FusionEngine {
    hosts: BTreeMap<IpAddr, Host>,
    commands: BTreeSet<String>,
    stats: FusionStats,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, source: NormalizedSource) {
        debug!("Folding {} ({} hosts)", source.source, source.hosts.len());

        self.stats.files_processed += 1;
        self.stats.skipped_records += source.skipped.len();
        if let Some(command) = source.command {
            self.commands.insert(command);
        }
        for host in source.hosts {
            self.stats.input_hosts += 1;
            self.stats.input_ports += host.ports.len();
            self.add_host(host);
        }
    }

    fn add_host(&mut self, host: Host) {
        let merged = match self.hosts.remove(&host.ip) {
            Some(existing) => existing.merge(host),
            None => host,
        };
        self.hosts.insert(merged.ip, merged);
    }

    /// Folds another partial engine into this one.
    pub fn absorb(&mut self, other: FusionEngine) {
        self.stats.files_processed += other.stats.files_processed;
        self.stats.input_hosts += other.stats.input_hosts;
        self.stats.input_ports += other.stats.input_ports;
        self.stats.skipped_records += other.stats.skipped_records;
        self.commands.extend(other.commands);

        for (_, host) in other.hosts {
            self.add_host(host);
        }
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn finish(self) -> FusionResult {
        self.finish_at(Utc::now())
    }

    pub fn finish_at(self, generated_at: DateTime<Utc>) -> FusionResult {
        let mut stats = self.stats;
        stats.unique_ips = self.hosts.len();
        stats.fused_ports = self.hosts.values().map(|h| h.ports.len()).sum();
        stats.duplicate_ports_removed = stats.input_ports.saturating_sub(stats.fused_ports);
        stats.scripts = self
            .hosts
            .values()
            .map(|h| h.scripts.len() + h.ports().map(|p| p.scripts.len()).sum::<usize>())
            .sum();

        info!(
            "Fused {} sources into {} hosts ({} duplicate ports absorbed)",
            stats.files_processed, stats.unique_ips, stats.duplicate_ports_removed
        );

        let dataset = FusedDataset::new(self.hosts, stats.files_processed, self.commands, generated_at);
        FusionResult { dataset, stats }
    }
}

/// Single-writer fold over `sources` in order.
pub fn fuse(sources: Vec<NormalizedSource>) -> FusionResult {
    let mut engine = FusionEngine::new();
    for source in sources {
        engine.add_source(source);
    }
    engine.finish()
}

/// Reduce-tree fold: one partial engine per source, merged pairwise.
pub fn fuse_parallel(sources: Vec<NormalizedSource>) -> FusionResult {
    sources
        .into_par_iter()
        .map(|source| {
            let mut engine = FusionEngine::new();
            engine.add_source(source);
            engine
        })
        .reduce(FusionEngine::new, |mut left, right| {
            left.absorb(right);
            left
        })
        .finish()
}
