use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, Service, Severity};
use nfusion_common::policy::OutdatedEntry;

use super::RiskRule;

/// Dotted numeric version. Missing components compare as zero, so `1.1 == 1.1.0`.
#[derive(Debug, Clone)]
pub struct Version(Vec<u64>);

impl Version {
    /// Reads the leading `digits(.digits)*` run; `"1.0.1e-fips"` is `1.0.1`.
    pub fn parse(text: &str) -> Option<Self> {
        let run: &str = text
            .trim_start()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or("");

        let parts = run
            .split('.')
            .take_while(|p| !p.is_empty())
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<u64>>>()?;

        (!parts.is_empty()).then_some(Version(parts))
    }

    /// First version number that follows `key` in `text` (both compared lowercase).
    pub fn after(text: &str, key: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let start = lower.find(key)? + key.len();
        let rest = &lower[start..];
        let digit = rest.find(|c: char| c.is_ascii_digit())?;
        Version::parse(&rest[digit..])
    }

    fn component(&self, i: usize) -> u64 {
        self.0.get(i).copied().unwrap_or(0)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

#[derive(Debug, Clone)]
struct Threshold {
    product: String,
    below: Version,
    severity: Severity,
}

/// Products running a version older than the policy's floor.
#[derive(Debug, Clone)]
pub struct OutdatedVersionRule {
    thresholds: Vec<Threshold>,
}

impl OutdatedVersionRule {
    pub fn new(table: &BTreeMap<String, OutdatedEntry>) -> Result<Self, ConfigError> {
        let mut thresholds = Vec::with_capacity(table.len());
        for (product, entry) in table {
            let key = product.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::EmptyName("outdated_versions"));
            }
            let below = Version::parse(&entry.below).ok_or_else(|| ConfigError::InvalidVersion {
                product: product.clone(),
                value: entry.below.clone(),
            })?;
            if !matches!(entry.severity, Severity::Medium | Severity::High) {
                return Err(ConfigError::InvalidSeverity {
                    product: product.clone(),
                    severity: entry.severity.as_str().to_string(),
                });
            }
            thresholds.push(Threshold {
                product: key,
                below,
                severity: entry.severity,
            });
        }
        Ok(Self { thresholds })
    }

    /// Version of `product` a service reports.
    ///
    /// The number always comes from the version field: after the key in
    /// `"{product} {version}"`, or the whole field when the service name is the
    /// key. Extra info never counts, and an unknown version reports nothing.
    fn detected(service: &Service, product: &str) -> Option<Version> {
        let version = service.version.as_known()?;
        let text = match service.product.as_known() {
            Some(name) => format!("{name} {version}"),
            None => version.to_string(),
        };
        if let Some(found) = Version::after(&text, product) {
            return Some(found);
        }
        let name_matches = service
            .name
            .as_known()
            .is_some_and(|n| n.eq_ignore_ascii_case(product));
        if name_matches {
            return Version::after(version, "");
        }
        None
    }
}

impl RiskRule for OutdatedVersionRule {
    fn name(&self) -> &'static str {
        FindingKind::OutdatedVersion.as_str()
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for host in dataset.hosts() {
            for port in host.open_ports() {
                for threshold in &self.thresholds {
                    let Some(found) = Self::detected(&port.service, &threshold.product) else {
                        continue;
                    };
                    if found < threshold.below {
                        findings.push(Finding::on_port(
                            host.ip,
                            port.key,
                            FindingKind::OutdatedVersion,
                            threshold.severity,
                            format!(
                                "{} {found} is older than {}",
                                threshold.product, threshold.below
                            ),
                        ));
                    }
                }
            }
        }
        findings
    }
}
