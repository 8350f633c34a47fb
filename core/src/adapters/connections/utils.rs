use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::domain::AddressFamily;

pub struct Utils;

impl Utils {
    /// Parse an address:port string as printed by `lsof -nP`.
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
    ///
    /// A wildcard address becomes the unspecified address of `family`.
    pub fn parse_address(address: &str, family: AddressFamily) -> Option<(IpAddr, u16)> {
        let (host, port_str) = if address.starts_with('[') {
            // IPv6 format: [::1]:3000
            let bracket_end = address.find(']')?;
            if bracket_end + 1 >= address.len() || address.as_bytes()[bracket_end + 1] != b':' {
                return None;
            }
            (&address[1..bracket_end], &address[bracket_end + 2..])
        } else {
            // IPv4 format: 127.0.0.1:3000 or *:8080
            let last_colon = address.rfind(':')?;
            (&address[..last_colon], &address[last_colon + 1..])
        };

        let port: u16 = port_str.parse().ok()?;
        let addr = if host.is_empty() || host == "*" {
            match family {
                AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            }
        } else {
            // Strip a zone suffix such as "%lo0"
            let host = host.split('%').next().unwrap_or(host);
            host.parse().ok()?
        };

        Some((addr, port))
    }
}
