use std::collections::BTreeSet;

use regex::Regex;

use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, Port, Severity};

use super::{RiskRule, compile_pattern};

/// Deprecated protocols and ciphers named in a service banner or in script output.
#[derive(Debug, Clone)]
pub struct WeakCipherRule {
    patterns: Vec<Regex>,
}

impl WeakCipherRule {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<Regex>, ConfigError>>()?;
        Ok(Self { patterns })
    }

    /// Distinct `(matched text, where)` pairs found in `text`.
    fn scan(&self, text: &str, location: &str, hits: &mut BTreeSet<(String, String)>) {
        for pattern in &self.patterns {
            for m in pattern.find_iter(text) {
                hits.insert((m.as_str().to_string(), location.to_string()));
            }
        }
    }

    fn scan_port(&self, port: &Port) -> BTreeSet<(String, String)> {
        let mut hits = BTreeSet::new();
        let banner = format!("{} {}", port.service.name.as_known().unwrap_or(""), port.service.banner());
        self.scan(banner.trim(), "service banner", &mut hits);
        for script in &port.scripts {
            self.scan(&script.output, &format!("script {}", script.id), &mut hits);
        }
        hits
    }
}

impl RiskRule for WeakCipherRule {
    fn name(&self) -> &'static str {
        FindingKind::WeakCipher.as_str()
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for host in dataset.hosts() {
            for port in host.open_ports() {
                for (matched, location) in self.scan_port(port) {
                    findings.push(Finding::on_port(
                        host.ip,
                        port.key,
                        FindingKind::WeakCipher,
                        Severity::High,
                        format!("weak cipher or protocol '{matched}' in {location}"),
                    ));
                }
            }

            let mut hits = BTreeSet::new();
            for script in &host.scripts {
                self.scan(&script.output, &format!("script {}", script.id), &mut hits);
            }
            for (matched, location) in hits {
                findings.push(Finding::on_host(
                    host.ip,
                    FindingKind::WeakCipher,
                    Severity::High,
                    format!("weak cipher or protocol '{matched}' in {location}"),
                ));
            }
        }
        findings
    }
}
