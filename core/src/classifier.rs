//! # Risk Classifier
//!
//! Evaluates a [`FusedDataset`] against the compiled [`RiskPolicy`]. Every rule
//! category is an independent [`RiskRule`]; the classifier only runs them and
//! collects what they report into one sorted [`FindingSet`].
//!
//! Compilation is where a policy is validated. A bad port key, weight, pattern
//! or version threshold fails [`RiskClassifier::from_policy`] before any rule
//! runs, so a run never reports findings from a half-understood policy.

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingSet, FusedDataset};
use nfusion_common::policy::RiskPolicy;

mod ambiguity;
mod ciphers;
mod ports;
mod scripts;
mod signatures;
mod versions;

pub use ambiguity::AmbiguousMergeRule;
pub use ciphers::WeakCipherRule;
pub use ports::{HighRiskPortRule, severity_for_weight};
pub use scripts::{CveReferenceRule, ScriptFlagRule};
pub use signatures::KnownVulnerableRule;
pub use versions::{OutdatedVersionRule, Version};

/// One category of risk heuristic.
///
/// Rules see the dataset read-only and must be deterministic: the same dataset
/// always yields the same findings.
pub trait RiskRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding>;
}

pub struct RiskClassifier {
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskClassifier {
    /// Compiles every non-empty table of `policy` into a rule.
    pub fn from_policy(policy: &RiskPolicy) -> Result<Self, ConfigError> {
        let mut rules: Vec<Box<dyn RiskRule>> = Vec::new();

        if !policy.high_risk_ports.is_empty() {
            rules.push(Box::new(HighRiskPortRule::new(&policy.high_risk_ports)?));
        }
        if !policy.weak_cipher_patterns.is_empty() {
            rules.push(Box::new(WeakCipherRule::new(&policy.weak_cipher_patterns)?));
        }
        if !policy.outdated_versions.is_empty() {
            rules.push(Box::new(OutdatedVersionRule::new(&policy.outdated_versions)?));
        }
        if !policy.vulnerable_signatures.is_empty() {
            rules.push(Box::new(KnownVulnerableRule::new(&policy.vulnerable_signatures)?));
        }
        if !policy.script_flags.is_empty() {
            rules.push(Box::new(ScriptFlagRule::new(&policy.script_flags)?));
        }
        if policy.flag_script_cves {
            rules.push(Box::new(CveReferenceRule));
        }
        rules.push(Box::new(AmbiguousMergeRule));

        debug!("Compiled {} risk rules", rules.len());
        Ok(Self { rules })
    }

    pub fn with_rule(mut self, rule: impl RiskRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn classify(&self, dataset: &FusedDataset) -> FindingSet {
        let findings: FindingSet = self
            .rules
            .par_iter()
            .flat_map_iter(|rule| {
                let found = rule.evaluate(dataset);
                debug!("{}: {} findings", rule.name(), found.len());
                found
            })
            .collect::<Vec<Finding>>()
            .into_iter()
            .collect();

        info!(
            "Classified {} hosts: {} findings",
            dataset.len(),
            findings.len()
        );
        findings
    }
}

/// Compiles and runs `policy` in one step.
pub fn classify(dataset: &FusedDataset, policy: &RiskPolicy) -> Result<FindingSet, ConfigError> {
    Ok(RiskClassifier::from_policy(policy)?.classify(dataset))
}

/// Policy patterns always match case-insensitively.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
