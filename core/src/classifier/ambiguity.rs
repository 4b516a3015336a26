use nfusion_common::model::detail::is_detail_tie;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, ServiceField, Severity};

use super::RiskRule;

/// Service fields and OS fingerprints where the kept value and a discarded one
/// ranked equal, so only the lexicographic tie-break decided between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbiguousMergeRule;

impl RiskRule for AmbiguousMergeRule {
    fn name(&self) -> &'static str {
        FindingKind::AmbiguousMerge.as_str()
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for host in dataset.hosts() {
            if let Some(kept) = &host.os {
                for other in &host.os_alternatives {
                    if other.accuracy == kept.accuracy && is_detail_tie(&kept.name, &other.name) {
                        findings.push(Finding::on_host(
                            host.ip,
                            FindingKind::AmbiguousMerge,
                            Severity::Low,
                            format!(
                                "os '{}' chosen over equally detailed '{}' at {}% accuracy",
                                kept.name, other.name, kept.accuracy
                            ),
                        ));
                    }
                }
            }
            for port in host.ports() {
                for field in ServiceField::ALL {
                    let Some(kept) = port.service.field(field).as_known() else {
                        continue;
                    };
                    for other in port.service.alternatives_for(field) {
                        if is_detail_tie(kept, other) {
                            findings.push(Finding::on_port(
                                host.ip,
                                port.key,
                                FindingKind::AmbiguousMerge,
                                Severity::Low,
                                format!("{field} '{kept}' chosen over equally detailed '{other}'"),
                            ));
                        }
                    }
                }
            }
        }
        findings
    }
}
