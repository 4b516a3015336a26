use std::path::PathBuf;

use nfusion_common::model::{FusedDataset, Host};
use nfusion_common::record::{RawHost, RawNumber, RawOs, RawPort, RawScript, RawService, SourceScan};
use nfusion_core::fusion::{self, FusionResult};
use nfusion_core::normalizer::normalize_all;

pub fn service(name: &str, product: &str, version: &str) -> Option<RawService> {
    Some(RawService {
        name: Some(name.into()),
        product: Some(product.into()),
        version: Some(version.into()),
        extra_info: None,
    })
}

pub fn port(number: u16, state: &str, service: Option<RawService>) -> RawPort {
    RawPort {
        port: Some(RawNumber::from(number)),
        protocol: Some("tcp".into()),
        state: Some(state.into()),
        service,
        scripts: Vec::new(),
        malformed: None,
    }
}

pub fn script(id: &str, output: &str) -> RawScript {
    RawScript {
        id: Some(id.into()),
        output: Some(output.into()),
    }
}

pub fn host(ip: &str, ports: Vec<RawPort>) -> RawHost {
    RawHost {
        ip: Some(ip.into()),
        status: Some("up".into()),
        ports,
        ..Default::default()
    }
}

pub fn with_os(mut host: RawHost, name: &str, accuracy: u32) -> RawHost {
    host.os = Some(RawOs {
        name: Some(name.into()),
        accuracy: Some(RawNumber::Number(i64::from(accuracy))),
    });
    host
}

/// Three overlapping sources about the same small network.
pub fn three_sources() -> Vec<SourceScan> {
    let mut ssl = port(443, "open", service("https", "", "OpenSSL 1.0.1"));
    ssl.scripts.push(script("ssl-enum-ciphers", "TLSv1.0: TLS_RSA_WITH_RC4_128_SHA - weak RC4"));

    vec![
        SourceScan::new(
            "quick.xml",
            vec![
                host("10.0.0.5", vec![port(443, "open", service("https", "", "")), port(22, "filtered", None)]),
                host("10.0.0.7", vec![port(80, "open", service("http", "nginx", "1.18.0"))]),
            ],
        ),
        SourceScan::new(
            "full.xml",
            vec![
                with_os(host("10.0.0.5", vec![ssl, port(22, "open", service("ssh", "OpenSSH", "7.4"))]), "Linux 3.X", 90),
                host("10.0.0.7", vec![port(80, "open", service("http", "nginx", "1.18.1"))]),
            ],
        ),
        SourceScan::new(
            "udp.gnmap",
            vec![
                with_os(host("10.0.0.5", vec![port(22, "closed", service("ssh", "OpenSSH", "7.4p1 Debian 10"))]), "Linux 4.15 - 5.6", 98),
                host("10.0.1.1", vec![port(23, "open", service("telnet", "", ""))]),
            ],
        ),
    ]
}

pub fn fuse_scans(scans: &[SourceScan]) -> FusionResult {
    fusion::fuse(normalize_all(scans))
}

pub fn fuse_scans_parallel(scans: &[SourceScan]) -> FusionResult {
    fusion::fuse_parallel(normalize_all(scans))
}

/// Hosts only; metadata carries a wall-clock timestamp.
pub fn hosts(dataset: &FusedDataset) -> Vec<Host> {
    dataset.hosts().cloned().collect()
}

pub fn reference_policy() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../policy/default.toml")
}
