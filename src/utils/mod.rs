//! Utility modules for the scanner

pub mod file_input;
pub mod target_parser;

use crate::ScanError;

/// Parse a port spec such as `443,8000-8100`
pub fn parse_ports(port_spec: &str) -> crate::Result<Vec<u16>> {
    let mut ports = Vec::new();

    for part in port_spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start
                .trim()
                .parse()
                .map_err(|e| ScanError::ParseError(format!("Invalid start port '{}': {}", start, e)))?;
            let end: u16 = end
                .trim()
                .parse()
                .map_err(|e| ScanError::ParseError(format!("Invalid end port '{}': {}", end, e)))?;

            if start == 0 || end == 0 {
                return Err(ScanError::ParseError("Port 0 is not valid".to_string()));
            }
            if start > end {
                return Err(ScanError::ParseError(format!(
                    "Start port {} cannot be greater than end port {}",
                    start, end
                )));
            }
            ports.extend(start..=end);
        } else {
            let port: u16 = part
                .parse()
                .map_err(|e| ScanError::ParseError(format!("Invalid port '{}': {}", part, e)))?;
            if port == 0 {
                return Err(ScanError::ParseError("Port 0 is not valid".to_string()));
            }
            ports.push(port);
        }
    }

    if ports.is_empty() {
        return Err(ScanError::ParseError("No ports specified".to_string()));
    }

    let mut seen = std::collections::HashSet::new();
    ports.retain(|port| seen.insert(*port));
    Ok(ports)
}
