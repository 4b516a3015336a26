use std::collections::BTreeSet;

use nfusion_common::model::{Detail, FusedDataset, Host, PortKey, PortState, ServiceField};
use nfusion_common::record::SourceScan;
use nfusion_core::normalizer::normalize_source;

use crate::support::*;

const ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

fn reorder(scans: &[SourceScan], order: [usize; 3]) -> Vec<SourceScan> {
    order.iter().map(|&i| scans[i].clone()).collect()
}

#[test]
fn every_permutation_of_three_sources_fuses_identically() {
    let scans = three_sources();
    let reference = hosts(&fuse_scans(&scans).dataset);

    for order in ORDERS {
        let permuted = reorder(&scans, order);
        assert_eq!(
            hosts(&fuse_scans(&permuted).dataset),
            reference,
            "order {order:?} changed the result"
        );
    }
}

#[test]
fn fusing_a_source_with_itself_is_a_no_op() {
    let scans = three_sources();

    for scan in &scans {
        let once = fuse_scans(std::slice::from_ref(scan)).dataset;
        let twice = fuse_scans(&[scan.clone(), scan.clone()]).dataset;
        assert_eq!(hosts(&once), hosts(&twice), "{} is not idempotent", scan.source);
        assert_same_metadata(&once, &twice);
    }

    let all = fuse_scans(&scans).dataset;
    let doubled: Vec<SourceScan> = scans.iter().chain(scans.iter()).cloned().collect();
    let doubled = fuse_scans(&doubled).dataset;
    assert_eq!(hosts(&doubled), hosts(&all));
    assert_same_metadata(&all, &doubled);
}

/// `twice` folded every source of `once` a second time. Only the clock and
/// `source_count`, which counts folds rather than distinct tags, may differ.
fn assert_same_metadata(once: &FusedDataset, twice: &FusedDataset) {
    let once = once.metadata();
    let mut twice = twice.metadata().clone();

    assert_eq!(twice.source_count, 2 * once.source_count);

    twice.generated_at = once.generated_at;
    twice.source_count = once.source_count;
    assert_eq!(&twice, once);
}

#[test]
fn sequential_and_parallel_folds_agree() {
    let scans = three_sources();
    let many: Vec<SourceScan> = (0..5).flat_map(|_| scans.clone()).collect();

    let sequential = fuse_scans(&many);
    let parallel = fuse_scans_parallel(&many);

    assert_eq!(hosts(&sequential.dataset), hosts(&parallel.dataset));
    assert_eq!(sequential.stats, parallel.stats);
}

#[test]
fn no_reported_value_is_lost() {
    let scans = three_sources();
    let fused = fuse_scans(&scans).dataset;

    for scan in &scans {
        for input in normalize_source(scan).hosts {
            let host = fused.host(&input.ip).expect("host survives fusion");
            for port in input.ports() {
                let merged = host.port(&port.key).expect("port survives fusion");
                for field in ServiceField::ALL {
                    let Some(value) = port.service.field(field).as_known() else {
                        continue;
                    };
                    let kept = merged.service.field(field) == &Detail::known(value);
                    let noted = merged.service.alternatives_for(field).any(|v| v == value);
                    assert!(
                        kept || noted,
                        "{} {} {field} '{value}' vanished",
                        input.ip,
                        port.key
                    );
                }
                assert!(merged.service.specificity() >= port.service.specificity());
                assert!(merged.sources.is_superset(&port.sources));
                assert!(merged.scripts.is_superset(&port.scripts));
            }
        }
    }
}

#[test]
fn one_host_per_ip_and_one_port_per_key() {
    let scans = three_sources();
    let fused = fuse_scans(&scans).dataset;

    let input_ips: BTreeSet<_> = scans
        .iter()
        .flat_map(|s| normalize_source(s).hosts)
        .map(|h| h.ip)
        .collect();
    assert_eq!(fused.len(), input_ips.len());

    for host in fused.hosts() {
        let input_keys: BTreeSet<PortKey> = scans
            .iter()
            .flat_map(|s| normalize_source(s).hosts)
            .filter(|h| h.ip == host.ip)
            .flat_map(|h: Host| h.ports.into_keys().collect::<Vec<_>>())
            .collect();
        let keys: Vec<PortKey> = host.ports().map(|p| p.key).collect();
        assert_eq!(keys, input_keys.into_iter().collect::<Vec<_>>());
    }
}

#[test]
fn most_open_state_wins() {
    let fused = fuse_scans(&three_sources()).dataset;
    let host = fused.host(&"10.0.0.5".parse().unwrap()).unwrap();

    // reported filtered, open and closed
    assert_eq!(host.port(&PortKey::tcp(22)).unwrap().state, PortState::Open);
}

#[test]
fn no_sources_no_hosts() {
    let result = fuse_scans(&[]);
    assert!(result.dataset.is_empty());
    assert_eq!(result.dataset.metadata().source_count, 0);

    let result = fuse_scans(&[SourceScan::new("empty.json", Vec::new())]);
    assert!(result.dataset.is_empty());
    assert_eq!(result.stats.files_processed, 1);
}
