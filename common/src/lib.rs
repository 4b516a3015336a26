//! # nfusion common
//!
//! Shared vocabulary for the fusion workspace.
//!
//! * **[`model`]**: the canonical Host / Port / Service / Finding shapes and the
//!   immutable [`model::dataset::FusedDataset`].
//! * **[`record`]**: the loosely typed per-source records handed over by the
//!   parsing layer, before normalization.
//! * **[`policy`]**: the externally supplied risk rule tables.
//! * **[`config`]**: run-time switches for the command line front end.
//! * **[`error`]**: the error taxonomy shared by every crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod policy;
pub mod record;
pub mod utils;
