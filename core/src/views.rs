//! # View Aggregator
//!
//! Read-only projections of a fused dataset and its findings. Every view is a
//! plain function of the dataset plus whatever it labels rows with (findings,
//! business functions), returns owned rows that serialize directly, and orders
//! them by data alone: hosts by IP, ports by protocol then number, groups by
//! their key.

use serde::Serialize;

use nfusion_common::model::{FindingSet, FusedDataset};
use nfusion_common::policy::BusinessFunctions;

mod detail;
mod distribution;
mod exposure;
mod subnets;
mod summary;

pub use detail::{HostDetail, PortDetail, detail};
pub use distribution::{PortDistribution, port_distribution};
pub use exposure::{ExposedHost, ExposedPort, ServiceExposure, service_exposure};
pub use subnets::{SubnetSummary, subnets};
pub use summary::{HostSummary, risk_score, summary};

/// Every view of one run, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Views {
    pub summary: Vec<HostSummary>,
    pub detail: Vec<HostDetail>,
    pub port_distribution: Vec<PortDistribution>,
    pub service_exposure: Vec<ServiceExposure>,
    pub subnets: Vec<SubnetSummary>,
}

impl Views {
    pub fn build(
        dataset: &FusedDataset,
        findings: &FindingSet,
        business: &BusinessFunctions,
    ) -> Self {
        Self {
            summary: summary(dataset, findings),
            detail: detail(dataset, findings, business),
            port_distribution: port_distribution(dataset),
            service_exposure: service_exposure(dataset, business),
            subnets: subnets(dataset, findings),
        }
    }
}
