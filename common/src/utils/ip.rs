use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Canonical form of an address: IPv4-mapped IPv6 collapses to plain IPv4.
pub fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

/// Grouping network of an address and its prefix length: the /24 for IPv4,
/// the /64 for IPv6.
pub fn network_of(ip: &IpAddr) -> (IpAddr, u8) {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            (IpAddr::V4(Ipv4Addr::new(a, b, c, 0)), 24)
        }
        IpAddr::V6(v6) => {
            let s = v6.segments();
            (IpAddr::V6(Ipv6Addr::new(s[0], s[1], s[2], s[3], 0, 0, 0, 0)), 64)
        }
    }
}

pub fn subnet_of(ip: &IpAddr) -> String {
    let (network, prefix) = network_of(ip);
    format!("{network}/{prefix}")
}
