//! Target parsing: turn host specs and port lists into `host:port` targets
//!
//! Accepted host forms:
//! - hostnames, kept verbatim so the TLS layer can send them as SNI
//! - IPv4 and IPv6 literals (IPv6 targets are bracketed)
//! - IPv4 and IPv6 CIDR blocks, expanded up to a configurable size

use crate::{Result, ScanError};
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::str::FromStr;

/// Type of host spec that was parsed
#[derive(Debug, Clone, PartialEq)]
pub enum TargetType {
    Address,
    Cidr,
    Hostname,
}

/// Host spec expanded to its concrete hosts
#[derive(Debug, Clone)]
pub struct ParsedTarget {
    pub original: String,
    pub target_type: TargetType,
    /// Hosts in `host:port` form minus the port; IPv6 already bracketed
    pub hosts: Vec<String>,
}

impl ParsedTarget {
    /// Pair every host with every port
    pub fn targets<'a>(&'a self, ports: &'a [u16]) -> impl Iterator<Item = String> + 'a {
        self.hosts
            .iter()
            .flat_map(move |host| ports.iter().map(move |port| format!("{}:{}", host, port)))
    }
}

/// Target parser with CIDR support
#[derive(Debug, Clone)]
pub struct TargetParser {
    max_cidr_addresses: u128,
}

impl Default for TargetParser {
    fn default() -> Self {
        Self {
            max_cidr_addresses: 65536, // Limit CIDR expansion
        }
    }
}

impl TargetParser {
    pub fn new(max_cidr_addresses: u128) -> Self {
        Self { max_cidr_addresses }
    }

    /// Parse a host spec
    pub fn parse_target(&self, target: &str) -> Result<ParsedTarget> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ScanError::InvalidTarget("empty target".to_string()));
        }

        if target.contains('/') {
            return self.parse_cidr(target);
        }

        let unbracketed = target.trim_start_matches('[').trim_end_matches(']');
        if let Ok(addr) = IpAddr::from_str(unbracketed) {
            return Ok(ParsedTarget {
                original: target.to_string(),
                target_type: TargetType::Address,
                hosts: vec![format_host(addr)],
            });
        }

        if !is_valid_hostname(target) {
            return Err(ScanError::InvalidTarget(format!("bad host name: {}", target)));
        }

        Ok(ParsedTarget {
            original: target.to_string(),
            target_type: TargetType::Hostname,
            hosts: vec![target.to_string()],
        })
    }

    /// Parse a host spec and pair it with `ports`
    pub fn expand(&self, target: &str, ports: &[u16]) -> Result<Vec<String>> {
        let parsed = self.parse_target(target)?;
        Ok(parsed.targets(ports).collect())
    }

    fn parse_cidr(&self, target: &str) -> Result<ParsedTarget> {
        let network = IpNetwork::from_str(target)
            .map_err(|e| ScanError::InvalidTarget(format!("bad CIDR block {}: {}", target, e)))?;

        let host_bits = match network {
            IpNetwork::V4(_) => 32 - u32::from(network.prefix()),
            IpNetwork::V6(_) => 128 - u32::from(network.prefix()),
        };
        let total = if host_bits >= 128 { u128::MAX } else { 1u128 << host_bits };

        if total > self.max_cidr_addresses {
            return Err(ScanError::InvalidTarget(format!(
                "CIDR network {} too large: {} addresses (max: {})",
                target, total, self.max_cidr_addresses
            )));
        }

        let hosts = match network {
            IpNetwork::V4(net) => net.iter().map(|a| format_host(IpAddr::V4(a))).collect(),
            IpNetwork::V6(net) => net.iter().map(|a| format_host(IpAddr::V6(a))).collect(),
        };

        Ok(ParsedTarget {
            original: target.to_string(),
            target_type: TargetType::Cidr,
            hosts,
        })
    }
}

fn format_host(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    }
}

fn is_valid_hostname(host: &str) -> bool {
    host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}
