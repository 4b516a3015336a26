//! # Conflict Resolver
//!
//! Pairwise merge rules for two values that describe the same key. Precedence:
//!
//! 1. **Specificity** for scalars: a known value beats `unknown`; of two known
//!    values the more detailed one wins (see [`detail::compare_detail`]). The
//!    losing value goes to the alternatives trail, never to the bin.
//! 2. **Union** for set-valued attributes: scripts, hostnames, provenance tags.
//! 3. **Escalation** for port state: `open > filtered > closed`. This is a
//!    deliberate conservative bias: if any source saw the port open, the fused
//!    record reports it open, because that is the finding that matters for risk.
//!
//! Every rule reads only the pair's content, so merging is commutative,
//! associative and idempotent. The fusion fold depends on that to be
//! order-independent.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use nfusion_common::model::detail::{self, Detail};
use nfusion_common::model::{Alternative, Host, OsFingerprint, Port, Service, ServiceField};

pub trait Merge {
    /// Combines two values for the same key into one.
    fn merge(self, other: Self) -> Self;
}

/// Picks the more specific of two known strings. Returns `(kept, discarded)`.
pub fn pick_specific(a: String, b: String) -> (String, Option<String>) {
    if a == b {
        return (a, None);
    }
    match detail::compare_detail(&a, &b) {
        Ordering::Less => (b, Some(a)),
        _ => (a, Some(b)),
    }
}

fn pick_detail(a: Detail, b: Detail) -> (Detail, Option<String>) {
    match (a, b) {
        (Detail::Known(a), Detail::Known(b)) => {
            let (kept, lost) = pick_specific(a, b);
            (Detail::Known(kept), lost)
        }
        (Detail::Known(a), Detail::Unknown) | (Detail::Unknown, Detail::Known(a)) => {
            (Detail::Known(a), None)
        }
        (Detail::Unknown, Detail::Unknown) => (Detail::Unknown, None),
    }
}

impl Merge for Service {
    fn merge(mut self, mut other: Service) -> Service {
        let mut alternatives: BTreeSet<Alternative> = std::mem::take(&mut self.alternatives);
        alternatives.append(&mut other.alternatives);

        let mut merged = Service::default();
        for field in ServiceField::ALL {
            let ours = std::mem::take(self.field_mut(field));
            let theirs = std::mem::take(other.field_mut(field));
            let (kept, lost) = pick_detail(ours, theirs);

            if let Some(value) = lost {
                debug!("service {field}: kept '{kept}', noted '{value}'");
                alternatives.insert(Alternative { field, value });
            }
            if let Detail::Known(value) = &kept {
                alternatives.remove(&Alternative {
                    field,
                    value: value.clone(),
                });
            }
            *merged.field_mut(field) = kept;
        }

        merged.alternatives = alternatives;
        merged
    }
}

impl Merge for Port {
    fn merge(mut self, mut other: Port) -> Port {
        debug_assert_eq!(self.key, other.key, "merging different ports");

        if self.state != other.state {
            debug!(
                "{}: states {} and {} escalate to {}",
                self.key,
                self.state,
                other.state,
                self.state.max(other.state)
            );
        }

        self.state = self.state.max(other.state);
        self.service = self.service.merge(other.service);
        self.scripts.append(&mut other.scripts);
        self.sources.append(&mut other.sources);
        self
    }
}

/// OS fingerprints rank by accuracy, then by name detail.
fn compare_os(a: &OsFingerprint, b: &OsFingerprint) -> Ordering {
    a.accuracy
        .cmp(&b.accuracy)
        .then_with(|| detail::compare_detail(&a.name, &b.name))
}

fn merge_os(
    ours: Option<OsFingerprint>,
    theirs: Option<OsFingerprint>,
    alternatives: &mut BTreeSet<OsFingerprint>,
) -> Option<OsFingerprint> {
    let kept = match (ours, theirs) {
        (Some(a), Some(b)) => {
            let (kept, lost) = match compare_os(&a, &b) {
                Ordering::Less => (b, a),
                _ => (a, b),
            };
            alternatives.insert(lost);
            Some(kept)
        }
        (Some(os), None) | (None, Some(os)) => Some(os),
        (None, None) => None,
    };

    // One entry per name, the best ranked; the kept name never appears.
    let mut best: BTreeMap<String, OsFingerprint> = BTreeMap::new();
    for os in std::mem::take(alternatives) {
        if kept.as_ref().is_some_and(|k| k.name == os.name) {
            continue;
        }
        match best.get(&os.name) {
            Some(current) if compare_os(current, &os) != Ordering::Less => {}
            _ => {
                best.insert(os.name.clone(), os);
            }
        }
    }
    *alternatives = best.into_values().collect();
    kept
}

/// Adds `port` to `host`, merging with an existing port of the same key.
pub fn insert_port(host: &mut Host, port: Port) {
    let merged = match host.ports.remove(&port.key) {
        Some(existing) => existing.merge(port),
        None => port,
    };
    host.ports.insert(merged.key, merged);
}

impl Merge for Host {
    fn merge(mut self, mut other: Host) -> Host {
        debug_assert_eq!(self.ip, other.ip, "merging different hosts");

        self.hostnames.append(&mut other.hostnames);
        self.status = self.status.max(other.status);

        let mut os_alternatives = std::mem::take(&mut self.os_alternatives);
        os_alternatives.append(&mut other.os_alternatives);
        self.os = merge_os(self.os.take(), other.os.take(), &mut os_alternatives);
        self.os_alternatives = os_alternatives;

        for (_, port) in std::mem::take(&mut other.ports) {
            insert_port(&mut self, port);
        }

        self.scripts.append(&mut other.scripts);
        self.sources.append(&mut other.sources);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfusion_common::model::{HostStatus, PortKey, PortState, ScriptResult};
    use std::net::{IpAddr, Ipv4Addr};

    fn svc(name: &str, product: &str, version: &str) -> Service {
        Service {
            name: Detail::known(name),
            product: Detail::known(product),
            version: Detail::known(version),
            ..Default::default()
        }
    }

    fn port(state: PortState, service: Service, source: &str) -> Port {
        let mut port = Port::new(PortKey::tcp(443), state);
        port.service = service;
        port.sources.insert(source.into());
        port
    }

    fn os(name: &str, accuracy: u8) -> OsFingerprint {
        OsFingerprint {
            name: name.into(),
            accuracy,
        }
    }

    fn host(os: Option<(&str, u8)>) -> Host {
        let mut host = Host::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));
        host.os = os.map(|(name, accuracy)| OsFingerprint {
            name: name.into(),
            accuracy,
        });
        host
    }

    #[test]
    fn known_beats_unknown() {
        let merged = svc("https", "", "").merge(svc("https", "", "OpenSSL 1.0.1"));

        assert_eq!(merged.version, Detail::known("OpenSSL 1.0.1"));
        assert!(merged.alternatives.is_empty());
    }

    #[test]
    fn more_detailed_value_wins_and_loser_is_noted() {
        let merged = svc("ssh", "OpenSSH", "7.4").merge(svc("ssh", "OpenSSH", "7.4p1 Debian 10"));

        assert_eq!(merged.version, Detail::known("7.4p1 Debian 10"));
        let noted: Vec<&str> = merged.alternatives_for(ServiceField::Version).collect();
        assert_eq!(noted, vec!["7.4"]);
    }

    #[test]
    fn tie_breaks_lexicographically_in_both_orders() {
        let a = svc("http", "nginx", "1.18.1");
        let b = svc("http", "nginx", "1.18.0");

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);

        assert_eq!(ab, ba);
        assert_eq!(ab.version, Detail::known("1.18.0"));
        assert_eq!(ab.alternatives_for(ServiceField::Version).collect::<Vec<_>>(), vec!["1.18.1"]);
    }

    #[test]
    fn service_merge_is_associative_and_idempotent() {
        let a = svc("http", "Apache httpd", "2.4");
        let b = svc("http", "Apache", "2.4.49");
        let c = svc("www", "Apache httpd", "2.4.41 ((Ubuntu))");

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.clone().merge(b.clone().merge(c.clone()));
        assert_eq!(left, right);

        assert_eq!(left.clone().merge(left.clone()), left);
        assert_eq!(left.clone().merge(b), left);
    }

    #[test]
    fn trail_never_holds_the_kept_value() {
        let a = svc("http", "", "2.4");
        let b = svc("http", "", "2.4.49");
        let merged = a.clone().merge(b).merge(a);

        assert!(merged.alternatives_for(ServiceField::Version).all(|v| v != "2.4.49"));
        assert_eq!(merged.version, Detail::known("2.4.49"));
    }

    #[test]
    fn specificity_never_regresses() {
        let inputs = [
            svc("https", "", ""),
            svc("https", "OpenSSL", "1.0.1"),
            svc("", "OpenSSL", "1.0.1e-fips"),
            Service::default(),
        ];
        let merged = inputs
            .iter()
            .cloned()
            .reduce(Merge::merge)
            .unwrap();

        for input in &inputs {
            assert!(merged.specificity() >= input.specificity());
        }
    }

    #[test]
    fn filtered_and_open_escalate_to_open() {
        let filtered = port(PortState::Filtered, Service::default(), "x");
        let open = port(PortState::Open, Service::default(), "y");

        let merged = filtered.clone().merge(open.clone());
        assert_eq!(merged.state, PortState::Open);
        assert_eq!(open.merge(filtered).state, PortState::Open);
        assert_eq!(merged.sources.len(), 2);
    }

    #[test]
    fn closed_loses_to_filtered() {
        let merged = port(PortState::Closed, Service::default(), "x")
            .merge(port(PortState::Filtered, Service::default(), "y"));
        assert_eq!(merged.state, PortState::Filtered);
    }

    #[test]
    fn scripts_union_without_duplicates() {
        let mut a = port(PortState::Open, Service::default(), "x");
        a.scripts.insert(ScriptResult::new("ssl-cert", "CN=example"));
        let mut b = port(PortState::Open, Service::default(), "y");
        b.scripts.insert(ScriptResult::new("ssl-cert", "CN=example"));
        b.scripts.insert(ScriptResult::new("http-title", "Welcome"));

        let merged = a.merge(b);
        let ids: Vec<&str> = merged.scripts.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["http-title", "ssl-cert"]);
    }

    #[test]
    fn host_keeps_most_accurate_os_and_notes_the_rest() {
        let mut a = host(Some(("Linux 3.X", 90)));
        a.hostnames.insert("web01".into());
        a.status = HostStatus::Down;
        let mut b = host(Some(("Linux 4.15 - 5.6", 98)));
        b.hostnames.insert("web01.corp".into());
        b.status = HostStatus::Up;

        let merged = a.clone().merge(b.clone());

        assert_eq!(merged.os_name(), "Linux 4.15 - 5.6");
        assert_eq!(merged.os_alternatives, BTreeSet::from([os("Linux 3.X", 90)]));
        assert_eq!(merged.hostnames.len(), 2);
        assert_eq!(merged.status, HostStatus::Up);
        assert_eq!(merged, b.merge(a));
    }

    #[test]
    fn os_merge_is_associative() {
        let a = host(Some(("Windows", 80)));
        let b = host(Some(("Linux", 90)));
        let c = host(Some(("Windows", 95)));

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));

        assert_eq!(left, right);
        assert_eq!(left.os_name(), "Windows");
        assert_eq!(left.os_alternatives, BTreeSet::from([os("Linux", 90)]));
    }

    #[test]
    fn os_trail_keeps_best_fingerprint_per_name() {
        let a = host(Some(("Windows", 80)));
        let b = host(Some(("Linux", 99)));
        let c = host(Some(("Windows", 95)));

        let abc = a.clone().merge(b.clone()).merge(c.clone());
        let cab = c.merge(a).merge(b);

        assert_eq!(abc, cab);
        assert_eq!(abc.os_name(), "Linux");
        assert_eq!(abc.os_alternatives, BTreeSet::from([os("Windows", 95)]));
    }

    #[test]
    fn equally_ranked_os_is_kept_lexicographically_and_noted() {
        let a = host(Some(("Linux 4.X", 90)));
        let b = host(Some(("Linux 5.X", 90)));

        let merged = a.clone().merge(b.clone());

        assert_eq!(merged, b.merge(a));
        assert_eq!(merged.os_name(), "Linux 4.X");
        assert_eq!(merged.os_alternatives, BTreeSet::from([os("Linux 5.X", 90)]));
    }

    #[test]
    fn host_merge_folds_ports_by_key() {
        let mut a = host(None);
        insert_port(&mut a, port(PortState::Open, svc("https", "", ""), "x"));
        let mut b = host(None);
        insert_port(&mut b, port(PortState::Open, svc("https", "", "OpenSSL 1.0.1"), "y"));
        let mut udp = Port::new(PortKey::udp(161), PortState::Open);
        udp.sources.insert("y".into());
        insert_port(&mut b, udp);

        let merged = a.merge(b);

        assert_eq!(merged.ports.len(), 2);
        let https = merged.port(&PortKey::tcp(443)).unwrap();
        assert_eq!(https.service.version, Detail::known("OpenSSL 1.0.1"));
        assert_eq!(https.sources, BTreeSet::from(["x".to_string(), "y".to_string()]));
    }
}
