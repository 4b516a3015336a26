use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, PortKey, ScriptResult, Severity};
use nfusion_common::policy::ScriptFlag;

use super::{RiskRule, compile_pattern};

static CVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,7}\b").expect("valid CVE pattern"));

/// Every script result in the dataset with the port it ran against.
fn script_results(dataset: &FusedDataset) -> impl Iterator<Item = (Finding, &ScriptResult)> {
    dataset.hosts().flat_map(|host| {
        let on_host = host.scripts.iter().map(move |s| (None, s));
        let on_ports = host
            .ports()
            .flat_map(|p| p.scripts.iter().map(move |s| (Some(p.key), s)));
        on_host
            .chain(on_ports)
            .map(move |(port, script)| (template(host.ip, port), script))
    })
}

fn template(ip: std::net::IpAddr, port: Option<PortKey>) -> Finding {
    let mut finding = Finding::on_host(ip, FindingKind::CustomScriptFlag, Severity::Info, "");
    finding.target.port = port;
    finding
}

#[derive(Debug, Clone)]
struct CompiledFlag {
    script: String,
    pattern: Option<Regex>,
    severity: Severity,
    detail: Option<String>,
}

/// Script results the policy names explicitly, optionally narrowed by an output pattern.
#[derive(Debug, Clone)]
pub struct ScriptFlagRule {
    flags: Vec<CompiledFlag>,
}

impl ScriptFlagRule {
    pub fn new(flags: &[ScriptFlag]) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(flags.len());
        for flag in flags {
            let script = flag.script.trim();
            if script.is_empty() {
                return Err(ConfigError::EmptyName("script_flags"));
            }
            compiled.push(CompiledFlag {
                script: script.to_string(),
                pattern: flag.pattern.as_deref().map(compile_pattern).transpose()?,
                severity: flag.severity,
                detail: flag.detail.clone(),
            });
        }
        Ok(Self { flags: compiled })
    }
}

impl RiskRule for ScriptFlagRule {
    fn name(&self) -> &'static str {
        "script-flag"
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (template, script) in script_results(dataset) {
            for flag in self.flags.iter().filter(|f| f.script == script.id) {
                let matched = match &flag.pattern {
                    None => None,
                    Some(pattern) => match pattern.find(&script.output) {
                        Some(m) => Some(m.as_str().to_string()),
                        None => continue,
                    },
                };

                let detail = match (&flag.detail, matched) {
                    (Some(detail), _) => format!("{}: {detail}", script.id),
                    (None, Some(m)) => format!("{}: output matched '{m}'", script.id),
                    (None, None) => format!("{} reported", script.id),
                };
                findings.push(Finding {
                    severity: flag.severity,
                    detail,
                    ..template.clone()
                });
            }
        }
        findings
    }
}

/// CVE identifiers mentioned anywhere in script output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CveReferenceRule;

impl RiskRule for CveReferenceRule {
    fn name(&self) -> &'static str {
        "script-cve"
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (template, script) in script_results(dataset) {
            let ids: BTreeSet<String> = CVE_PATTERN
                .find_iter(&script.output)
                .map(|m| m.as_str().to_uppercase())
                .collect();
            for id in ids {
                findings.push(Finding {
                    severity: Severity::High,
                    detail: format!("{id} referenced by {}", script.id),
                    ..template.clone()
                });
            }
        }
        findings
    }
}
