use nfusion_common::error::ConfigError;
use nfusion_common::model::{Finding, FindingKind, FusedDataset, Service, Severity};
use nfusion_common::policy::VulnerableSignature;

use super::RiskRule;

#[derive(Debug, Clone)]
struct Signature {
    /// `"product version"`, lowercase, without the wildcard.
    target: String,
    prefix: bool,
    product: String,
    label: String,
}

impl Signature {
    fn compile(raw: &VulnerableSignature) -> Result<Self, ConfigError> {
        let product = raw.product.trim().to_lowercase();
        if product.is_empty() {
            return Err(ConfigError::EmptyName("vulnerable_signatures"));
        }
        let version = raw.version.trim().to_lowercase();
        if version.is_empty() {
            return Err(ConfigError::InvalidVersion {
                product: raw.product.clone(),
                value: raw.version.clone(),
            });
        }

        let (version, prefix) = match version.strip_suffix('*') {
            Some(stem) => (stem.to_string(), true),
            None => (version, false),
        };

        let label = match (&raw.id, &raw.detail) {
            (Some(id), Some(detail)) => format!("{id}: {detail}"),
            (Some(id), None) => id.clone(),
            (None, Some(detail)) => detail.clone(),
            (None, None) => format!("{} {}", raw.product.trim(), raw.version.trim()),
        };

        Ok(Self {
            target: format!("{product} {version}"),
            prefix,
            product,
            label,
        })
    }

    fn matches_text(&self, text: &str) -> bool {
        if self.prefix {
            text.starts_with(&self.target)
        } else {
            text == self.target
                || text
                    .strip_prefix(&self.target)
                    .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        }
    }

    /// Product and version as one string in the three shapes scanners report:
    /// split across product and version, all in the version field, or the
    /// product only implied by the service name.
    fn matches(&self, service: &Service) -> bool {
        let Some(version) = service.version.as_known() else {
            return false;
        };
        let version = version.to_lowercase();

        let mut candidates = vec![version.clone()];
        if let Some(product) = service.product.as_known() {
            candidates.push(format!("{} {version}", product.to_lowercase()));
        }
        if service
            .name
            .as_known()
            .is_some_and(|n| n.eq_ignore_ascii_case(&self.product))
        {
            candidates.push(format!("{} {version}", self.product));
        }

        candidates.iter().any(|text| self.matches_text(text))
    }
}

/// Exact product/version pairs with a known vulnerability. Always critical.
#[derive(Debug, Clone)]
pub struct KnownVulnerableRule {
    signatures: Vec<Signature>,
}

impl KnownVulnerableRule {
    pub fn new(signatures: &[VulnerableSignature]) -> Result<Self, ConfigError> {
        let signatures = signatures
            .iter()
            .map(Signature::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { signatures })
    }
}

impl RiskRule for KnownVulnerableRule {
    fn name(&self) -> &'static str {
        FindingKind::KnownVulnerable.as_str()
    }

    fn evaluate(&self, dataset: &FusedDataset) -> Vec<Finding> {
        let mut findings = Vec::new();
        for host in dataset.hosts() {
            for port in host.open_ports() {
                for signature in self.signatures.iter().filter(|s| s.matches(&port.service)) {
                    findings.push(Finding::on_port(
                        host.ip,
                        port.key,
                        FindingKind::KnownVulnerable,
                        Severity::Critical,
                        signature.label.clone(),
                    ));
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::test_support::*;
    use nfusion_common::model::{PortKey, PortState};

    fn sig(product: &str, version: &str, id: Option<&str>) -> VulnerableSignature {
        VulnerableSignature {
            product: product.into(),
            version: version.into(),
            id: id.map(str::to_string),
            detail: None,
        }
    }

    fn matches(signature: &VulnerableSignature, service: Service) -> bool {
        Signature::compile(signature).unwrap().matches(&service)
    }

    #[test]
    fn exact_version_matches_whole_tokens_only() {
        let apache = sig("Apache httpd", "2.4.49", Some("CVE-2021-41773"));

        assert!(matches(&apache, service("http", "Apache httpd", "2.4.49")));
        assert!(matches(&apache, service("http", "Apache httpd", "2.4.49 (Unix)")));
        assert!(!matches(&apache, service("http", "Apache httpd", "2.4.491")));
        assert!(!matches(&apache, service("http", "Apache httpd", "2.4.50")));
    }

    #[test]
    fn wildcard_is_a_prefix_match() {
        let openssl = sig("openssl", "1.0.1*", None);

        assert!(matches(&openssl, service("https", "", "OpenSSL 1.0.1")));
        assert!(matches(&openssl, service("https", "OpenSSL", "1.0.1e-fips")));
        assert!(matches(&openssl, service("openssl", "", "1.0.1g")));
        assert!(!matches(&openssl, service("https", "OpenSSL", "1.0.2")));
        assert!(!matches(&openssl, service("https", "", "")));
    }

    #[test]
    fn finding_carries_the_signature_id() {
        let data = dataset(vec![host(
            "10.0.0.5",
            vec![port(PortKey::tcp(443), PortState::Open, service("https", "", "OpenSSL 1.0.1"))],
        )]);
        let rule = KnownVulnerableRule::new(&[VulnerableSignature {
            detail: Some("Heartbleed".into()),
            ..sig("OpenSSL", "1.0.1*", Some("CVE-2014-0160"))
        }])
        .unwrap();

        let findings = rule.evaluate(&data);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].detail, "CVE-2014-0160: Heartbleed");
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            KnownVulnerableRule::new(&[sig("", "1.0", None)]),
            Err(ConfigError::EmptyName("vulnerable_signatures"))
        ));
        assert!(matches!(
            KnownVulnerableRule::new(&[sig("openssl", " ", None)]),
            Err(ConfigError::InvalidVersion { .. })
        ));
    }
}
