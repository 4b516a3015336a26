use std::collections::BTreeMap;

use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, Severity};

use super::RiskRule;

/// Open ports on the policy's watch list, weighted 1..=10.
///
/// The number alone decides; a port listed as `23` is flagged on TCP and UDP.
#[derive(Debug, Clone)]
pub struct HighRiskPortRule {
    weights: BTreeMap<u16, u8>,
}

impl HighRiskPortRule {
    pub fn new(table: &BTreeMap<String, u8>) -> Result<Self, ConfigError> {
        let mut weights = BTreeMap::new();
        for (key, &weight) in table {
            let port: u16 = key
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(key.clone()))?;
            if !(1..=10).contains(&weight) {
                return Err(ConfigError::InvalidWeight { port, weight });
            }
            weights.insert(port, weight);
        }
        Ok(Self { weights })
    }
}

pub fn severity_for_weight(weight: u8) -> Severity {
    match weight {
        0 => Severity::Info,
        1..=3 => Severity::Low,
        4..=6 => Severity::Medium,
        7..=8 => Severity::High,
        _ => Severity::Critical,
    }
}

impl RiskRule for HighRiskPortRule {
    fn name(&self) -> &'static str {
        FindingKind::HighRiskPort.as_str()
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for host in dataset.hosts() {
            for port in host.open_ports() {
                let Some(&weight) = self.weights.get(&port.key.number) else {
                    continue;
                };
                findings.push(Finding::on_port(
                    host.ip,
                    port.key,
                    FindingKind::HighRiskPort,
                    severity_for_weight(weight),
                    format!(
                        "{} ({}) is open, risk weight {weight}",
                        port.key, port.service.name
                    ),
                ));
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::test_support::*;
    use nfusion_common::model::{PortKey, PortState, Service};

    fn rule(entries: &[(&str, u8)]) -> Result<HighRiskPortRule, ConfigError> {
        let table = entries.iter().map(|(k, w)| (k.to_string(), *w)).collect();
        HighRiskPortRule::new(&table)
    }

    #[test]
    fn weight_bands() {
        assert_eq!(severity_for_weight(1), Severity::Low);
        assert_eq!(severity_for_weight(3), Severity::Low);
        assert_eq!(severity_for_weight(4), Severity::Medium);
        assert_eq!(severity_for_weight(6), Severity::Medium);
        assert_eq!(severity_for_weight(7), Severity::High);
        assert_eq!(severity_for_weight(8), Severity::High);
        assert_eq!(severity_for_weight(9), Severity::Critical);
        assert_eq!(severity_for_weight(10), Severity::Critical);
    }

    #[test]
    fn only_open_ports_are_flagged() {
        let data = dataset(vec![
            host(
                "10.0.0.1",
                vec![
                    port(PortKey::tcp(23), PortState::Open, service("telnet", "", "")),
                    port(PortKey::udp(23), PortState::Filtered, Service::default()),
                ],
            ),
            host(
                "10.0.0.2",
                vec![port(PortKey::tcp(23), PortState::Closed, Service::default())],
            ),
        ]);

        let findings = rule(&[("23", 9)]).unwrap().evaluate(&data);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].target.port, Some(PortKey::tcp(23)));
        assert_eq!(findings[0].detail, "23/tcp (telnet) is open, risk weight 9");
    }

    #[test]
    fn bad_keys_and_weights_are_rejected() {
        assert!(matches!(rule(&[("telnet", 5)]), Err(ConfigError::InvalidPort(k)) if k == "telnet"));
        assert!(matches!(rule(&[("70000", 5)]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(
            rule(&[("23", 0)]),
            Err(ConfigError::InvalidWeight { port: 23, weight: 0 })
        ));
        assert!(matches!(
            rule(&[("23", 11)]),
            Err(ConfigError::InvalidWeight { weight: 11, .. })
        ));
    }
}
