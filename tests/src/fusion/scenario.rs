use std::io::Write;
use std::net::IpAddr;

use nfusion_common::config::Config;
use nfusion_common::error::ConfigError;
use nfusion_common::model::{
    Detail, FindingKind, FindingSet, PortKey, PortState, Severity, ServiceField,
};
use nfusion_common::policy::RiskPolicy;
use nfusion_common::record::{RawHost, SourceScan};
use nfusion_core::classifier::classify;
use nfusion_core::pipeline::analyze;

use crate::support::*;

fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

#[test]
fn openssl_on_443_fuses_and_classifies() {
    let fused = fuse_scans(&three_sources()).dataset;
    let host = fused.host(&ip("10.0.0.5")).unwrap();

    let https = host.port(&PortKey::tcp(443)).unwrap();
    assert_eq!(https.state, PortState::Open);
    assert_eq!(https.service.name, Detail::known("https"));
    assert_eq!(https.service.version, Detail::known("OpenSSL 1.0.1"));
    assert_eq!(https.sources.len(), 2);
    assert_eq!(https.scripts.len(), 1);

    let ssh = host.port(&PortKey::tcp(22)).unwrap();
    assert_eq!(ssh.service.version, Detail::known("7.4p1 Debian 10"));
    assert_eq!(
        ssh.service.alternatives_for(ServiceField::Version).collect::<Vec<_>>(),
        vec!["7.4"]
    );

    assert_eq!(host.os_name(), "Linux 4.15 - 5.6");
    let noted: Vec<(&str, u8)> = host
        .os_alternatives
        .iter()
        .map(|os| (os.name.as_str(), os.accuracy))
        .collect();
    assert_eq!(noted, vec![("Linux 3.X", 90)]);

    let policy = RiskPolicy::from_file(&reference_policy()).unwrap();
    let findings = classify(&fused, &policy).unwrap();
    let on_https: Vec<(FindingKind, Severity)> = findings
        .for_port(ip("10.0.0.5"), PortKey::tcp(443))
        .map(|f| (f.kind, f.severity))
        .collect();

    assert!(on_https.contains(&(FindingKind::OutdatedVersion, Severity::High)));
    assert!(on_https.contains(&(FindingKind::KnownVulnerable, Severity::Critical)));
    assert!(on_https.contains(&(FindingKind::WeakCipher, Severity::High)));
    assert!(findings.has_at_least(Severity::High));
}

#[test]
fn reference_policy_flags_the_whole_sample() {
    let policy = RiskPolicy::from_file(&reference_policy()).unwrap();
    let analysis = analyze(&three_sources(), &policy, &Config::default());
    let findings = analysis.findings.as_ref().unwrap();

    let telnet: Vec<_> = findings.for_port(ip("10.0.1.1"), PortKey::tcp(23)).collect();
    assert_eq!(telnet.len(), 1);
    assert_eq!(telnet[0].kind, FindingKind::HighRiskPort);
    assert_eq!(telnet[0].severity, Severity::Critical);

    let nginx: Vec<FindingKind> = findings
        .for_port(ip("10.0.0.7"), PortKey::tcp(80))
        .map(|f| f.kind)
        .collect();
    assert!(nginx.contains(&FindingKind::AmbiguousMerge));
    assert!(nginx.contains(&FindingKind::OutdatedVersion));

    let views = analysis.views();
    let risk: Vec<(String, Severity)> = views
        .summary
        .iter()
        .map(|row| (row.ip.to_string(), row.risk_level))
        .collect();
    assert_eq!(risk[0], ("10.0.0.5".to_string(), Severity::Critical));
    assert_eq!(risk[2], ("10.0.1.1".to_string(), Severity::Critical));

    let labels: Vec<(u16, &str)> = views.detail[0]
        .ports
        .iter()
        .map(|p| (p.port, p.business_function.as_str()))
        .collect();
    assert!(labels.contains(&(22, "remote_access")));
    assert!(labels.contains(&(443, "web")));
}

#[test]
fn no_input_files_yield_an_empty_analysis() {
    let policy = RiskPolicy::from_file(&reference_policy()).unwrap();
    let analysis = analyze(&[], &policy, &Config::default());

    assert_eq!(analysis.findings.as_ref().ok(), Some(&FindingSet::new()));
    assert!(analysis.dataset.is_empty());
    assert!(analysis.skipped.is_empty());
    assert_eq!(analysis.stats.files_processed, 0);

    let views = analysis.views();
    assert!(views.summary.is_empty());
    assert!(views.detail.is_empty());
    assert!(views.port_distribution.is_empty());
    assert!(views.service_exposure.is_empty());
    assert!(views.subnets.is_empty());
}

#[test]
fn invalid_policy_file_keeps_fusion_results() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[high_risk_ports]\n\"23\" = 42\n").unwrap();
    let policy = RiskPolicy::from_file(file.path()).unwrap();

    let analysis = analyze(&three_sources(), &policy, &Config::default());

    assert!(matches!(
        analysis.findings,
        Err(ConfigError::InvalidWeight { port: 23, weight: 42 })
    ));
    assert_eq!(analysis.dataset.len(), 3);
    assert_eq!(analysis.views().detail.len(), 3);
}

#[test]
fn malformed_records_are_skipped_not_fatal() {
    let mut scans = three_sources();
    scans.push(SourceScan::new(
        "broken.json",
        vec![
            RawHost::default(),
            host("10.0.0.300", Vec::new()),
            host("10.0.0.9", vec![port(22, "half-open", None), port(25, "open", None)]),
        ],
    ));

    let analysis = analyze(&scans, &RiskPolicy::default(), &Config::default());

    assert_eq!(analysis.skipped.len(), 3);
    assert_eq!(analysis.stats.skipped_records, 3);
    let survivor = analysis.dataset.host(&ip("10.0.0.9")).unwrap();
    assert_eq!(survivor.ports.len(), 1);
}

#[test]
fn views_are_stable_across_runs_and_orders() {
    let scans = three_sources();
    let mut reversed = scans.clone();
    reversed.reverse();

    let a = analyze(&scans, &RiskPolicy::default(), &Config::default());
    let b = analyze(&reversed, &RiskPolicy::default(), &Config::default());

    let va = serde_json::to_value(a.views()).unwrap();
    let vb = serde_json::to_value(b.views()).unwrap();
    assert_eq!(va, vb);

    let ips: Vec<&str> = va["summary"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["ip"].as_str().unwrap())
        .collect();
    assert_eq!(ips, vec!["10.0.0.5", "10.0.0.7", "10.0.1.1"]);

    let ports: Vec<u64> = va["port_distribution"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["port"].as_u64().unwrap())
        .collect();
    assert_eq!(ports, vec![22, 23, 80, 443]);
}
