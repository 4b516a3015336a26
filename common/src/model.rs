//! # Domain Model
//!
//! Canonical shapes every stage after normalization works with. Set-valued
//! attributes are `BTreeSet`s and keyed collections are `BTreeMap`s, so iteration
//! order is a property of the data alone and identical inputs always render
//! identically.

pub mod dataset;
pub mod detail;
pub mod finding;
pub mod host;
pub mod port;
pub mod service;

pub use dataset::{DatasetMetadata, FusedDataset};
pub use detail::Detail;
pub use finding::{Finding, FindingKind, FindingSet, FindingTarget, Severity, SeveritySummary};
pub use host::{Host, HostStatus, OsFingerprint};
pub use port::{Port, PortKey, PortState, Protocol, ScriptResult};
pub use service::{Alternative, Service, ServiceField};
