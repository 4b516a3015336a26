//! End-to-end run: normalize, fuse, classify.
//!
//! Classification depends on the policy, fusion does not. An invalid policy
//! therefore costs the findings but never the fused dataset: [`Analysis`]
//! carries the dataset and the classification result side by side.

use tracing::{error, info};

use nfusion_common::config::Config;
use nfusion_common::error::ConfigError;
use nfusion_common::model::{FindingSet, FusedDataset};
use nfusion_common::policy::{BusinessFunctions, RiskPolicy};
use nfusion_common::record::SourceScan;

use crate::classifier::RiskClassifier;
use crate::fusion::{self, FusionResult, FusionStats};
use crate::normalizer::{self, SkippedRecord};
use crate::views::Views;

#[derive(Debug)]
pub struct Analysis {
    pub dataset: FusedDataset,
    pub stats: FusionStats,
    pub skipped: Vec<SkippedRecord>,
    pub findings: Result<FindingSet, ConfigError>,
    /// Port labels from the policy; kept even when its rules are rejected.
    pub business: BusinessFunctions,
}

impl Analysis {
    /// Views over the dataset. Without valid findings every view is risk-free.
    pub fn views(&self) -> Views {
        match &self.findings {
            Ok(findings) => Views::build(&self.dataset, findings, &self.business),
            Err(_) => Views::build(&self.dataset, &FindingSet::new(), &self.business),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.findings.is_ok()
    }
}

pub fn analyze(scans: &[SourceScan], policy: &RiskPolicy, config: &Config) -> Analysis {
    let normalized = normalizer::normalize_all(scans);
    let skipped: Vec<SkippedRecord> = normalized
        .iter()
        .flat_map(|source| source.skipped.iter().cloned())
        .collect();

    let FusionResult { dataset, stats } = if config.parallel {
        fusion::fuse_parallel(normalized)
    } else {
        fusion::fuse(normalized)
    };

    let findings = match RiskClassifier::from_policy(policy) {
        Ok(classifier) => Ok(classifier.classify(&dataset)),
        Err(e) => {
            error!("Risk policy rejected, skipping classification: {e}");
            Err(e)
        }
    };

    info!(
        "Analysis finished: {} hosts, {} skipped records",
        dataset.len(),
        skipped.len()
    );

    Analysis {
        dataset,
        stats,
        skipped,
        findings,
        business: policy.business_functions(),
    }
}
