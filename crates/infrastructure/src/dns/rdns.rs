//! Reverse-lookup names and the private address space.

use ipnetwork::IpNetwork;
use sluice_dns_domain::DomainError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

const V4_ZONE: &str = ".in-addr.arpa";
const V6_ZONE: &str = ".ip6.arpa";

/// `1.2.0.192.in-addr.arpa` style name for `ip`.
pub fn ip_to_reverse_domain(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            format!("{}.{}.{}.{}{}", o[3], o[2], o[1], o[0], V4_ZONE)
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(72);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str(&V6_ZONE[1..]);
            name
        }
    }
}

/// Address named by a complete reverse-lookup name, if it is one.
pub fn reverse_domain_to_ip(name: &str) -> Option<IpAddr> {
    let name = name.trim_end_matches('.').to_ascii_lowercase();

    if let Some(labels) = name.strip_suffix(V4_ZONE) {
        let mut octets = labels
            .split('.')
            .map(|l| l.parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        if octets.len() != 4 {
            return None;
        }
        octets.reverse();
        return Some(IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])));
    }

    if let Some(labels) = name.strip_suffix(V6_ZONE) {
        let nibbles = labels
            .split('.')
            .map(|l| match l.len() {
                1 => u8::from_str_radix(l, 16).ok(),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()?;
        if nibbles.len() != 32 {
            return None;
        }
        let mut octets = [0u8; 16];
        for (i, pair) in nibbles.chunks(2).rev().enumerate() {
            octets[i] = (pair[1] << 4) | pair[0];
        }
        return Some(IpAddr::V6(Ipv6Addr::from(octets)));
    }

    None
}

/// Networks whose reverse lookups go to the private rDNS upstreams.
#[derive(Debug, Clone, Default)]
pub struct PrivateNetworks {
    nets: Vec<IpNetwork>,
}

impl PrivateNetworks {
    /// Parses CIDRs; an empty list means the locally-served default set.
    pub fn parse(cidrs: &[String]) -> Result<Self, DomainError> {
        let nets = cidrs
            .iter()
            .map(|c| {
                IpNetwork::from_str(c.trim())
                    .map_err(|e| DomainError::ProxyBuild(format!("private network '{}': {}", c, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nets })
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        if self.nets.is_empty() {
            return is_private_or_local(ip);
        }
        self.nets.iter().any(|net| net.contains(*ip))
    }
}

fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            v4.is_private()
                || v4.is_link_local()
                || v4.is_loopback()
                || (o[0] == 100 && (o[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local()
        }
    }
}
