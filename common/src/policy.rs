//! # Risk Policy
//!
//! The rule tables the classifier evaluates. Nothing here is built in: every
//! table comes from a TOML or JSON file, and an empty policy only reports merge
//! ambiguities.
//!
//! Only the shape is checked while loading. Semantic checks (port numbers,
//! weights, patterns, versions) happen when the classifier compiles the policy.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::Severity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskPolicy {
    /// Port number (as text) → weight 1..=10.
    pub high_risk_ports: BTreeMap<String, u8>,
    /// Case-insensitive regular expressions for deprecated protocols and ciphers.
    pub weak_cipher_patterns: Vec<String>,
    /// Product name → first version that is no longer considered outdated.
    pub outdated_versions: BTreeMap<String, OutdatedEntry>,
    pub vulnerable_signatures: Vec<VulnerableSignature>,
    pub script_flags: Vec<ScriptFlag>,
    /// Raise a finding for every CVE identifier mentioned in script output.
    pub flag_script_cves: bool,
    /// Business function name → ports serving it. Labels views, raises no findings.
    pub business_ports: BTreeMap<String, Vec<u16>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutdatedEntry {
    pub below: String,
    #[serde(default = "default_outdated_severity")]
    pub severity: Severity,
}

fn default_outdated_severity() -> Severity {
    Severity::Medium
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VulnerableSignature {
    pub product: String,
    /// Exact version, or a prefix ending in `*`.
    pub version: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptFlag {
    /// Script id to match exactly.
    pub script: String,
    /// Optional case-insensitive pattern the output must match.
    #[serde(default)]
    pub pattern: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub detail: Option<String>,
}

impl RiskPolicy {
    /// Load a policy; the format follows the file extension (`.toml` or `.json`).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
                path: path.display().to_string(),
                source: e,
            }),
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Err(ConfigError::UnsupportedFormat(
                path.display().to_string(),
                ext,
            )),
        }
    }

    /// Port lookup for [`RiskPolicy::business_ports`].
    pub fn business_functions(&self) -> BusinessFunctions {
        let mut by_port = BTreeMap::new();
        for (function, ports) in &self.business_ports {
            for port in ports {
                by_port.entry(*port).or_insert_with(|| function.clone());
            }
        }
        BusinessFunctions { by_port }
    }

    /// True when no rule table is set. `business_ports` only labels views.
    pub fn is_empty(&self) -> bool {
        self.high_risk_ports.is_empty()
            && self.weak_cipher_patterns.is_empty()
            && self.outdated_versions.is_empty()
            && self.vulnerable_signatures.is_empty()
            && self.script_flags.is_empty()
            && !self.flag_script_cves
    }
}

/// Which business function a port number serves. A port listed under several
/// functions belongs to the first one by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessFunctions {
    by_port: BTreeMap<u16, String>,
}

impl BusinessFunctions {
    pub const OTHER: &'static str = "other";

    pub fn function_of(&self, port: u16) -> &str {
        self.by_port.get(&port).map_or(Self::OTHER, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
flag_script_cves = true
weak_cipher_patterns = ["\\bRC4\\b"]

[high_risk_ports]
"23" = 9

[outdated_versions.openssl]
below = "1.1.1"
severity = "high"

[outdated_versions.openssh]
below = "8.0"

[[vulnerable_signatures]]
product = "apache httpd"
version = "2.4.49"
id = "CVE-2021-41773"

[business_ports]
web = [80, 443]
remote_access = [22, 3389]
"#;

    #[test]
    fn default_policy_is_empty() {
        assert!(RiskPolicy::default().is_empty());
    }

    #[test]
    fn loads_toml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let policy = RiskPolicy::from_file(file.path()).unwrap();

        assert!(policy.flag_script_cves);
        assert_eq!(policy.high_risk_ports.get("23"), Some(&9));
        assert_eq!(policy.outdated_versions["openssl"].severity, Severity::High);
        assert_eq!(policy.outdated_versions["openssh"].severity, Severity::Medium);
        assert_eq!(policy.vulnerable_signatures[0].id.as_deref(), Some("CVE-2021-41773"));
    }

    #[test]
    fn business_functions_label_ports() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let policy = RiskPolicy::from_file(file.path()).unwrap();

        let functions = policy.business_functions();
        assert_eq!(functions.function_of(443), "web");
        assert_eq!(functions.function_of(22), "remote_access");
        assert_eq!(functions.function_of(5432), BusinessFunctions::OTHER);
        assert_eq!(RiskPolicy::default().business_functions().function_of(80), "other");
    }

    #[test]
    fn port_listed_twice_goes_to_first_function_by_name() {
        let mut policy = RiskPolicy::default();
        policy.business_ports.insert("web".into(), vec![8080]);
        policy.business_ports.insert("monitoring".into(), vec![8080, 9100]);

        let functions = policy.business_functions();
        assert_eq!(functions.function_of(8080), "monitoring");
        assert_eq!(functions.function_of(9100), "monitoring");
        assert!(policy.is_empty());
    }

    #[test]
    fn loads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"high_risk_ports":{"3389":7}}"#).unwrap();

        let policy = RiskPolicy::from_file(file.path()).unwrap();
        assert_eq!(policy.high_risk_ports.get("3389"), Some(&7));
        assert!(!policy.flag_script_cves);
    }

    #[test]
    fn rejects_unknown_extension_and_keys() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            RiskPolicy::from_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_, ext)) if ext == "yaml"
        ));

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"risky_ports = [1]").unwrap();
        assert!(matches!(
            RiskPolicy::from_file(file.path()),
            Err(ConfigError::ParseToml { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = RiskPolicy::from_file(Path::new("/nonexistent/policy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
