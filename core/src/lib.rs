//! # nfusion core
//!
//! The fusion and risk-classification engine. Data moves one way:
//!
//! 1. [`normalizer`] turns loosely typed source records into canonical hosts.
//! 2. [`fusion`] folds every source into one [`FusedDataset`], delegating each
//!    collision to the pairwise rules in [`resolver`].
//! 3. [`classifier`] evaluates the fused hosts against a [`RiskPolicy`].
//! 4. [`views`] projects dataset and findings into report-ready tables.
//!
//! [`pipeline`] runs the whole chain. Nothing in this crate performs I/O.
//!
//! [`FusedDataset`]: nfusion_common::model::FusedDataset
//! [`RiskPolicy`]: nfusion_common::policy::RiskPolicy

pub mod classifier;
pub mod fusion;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod views;
