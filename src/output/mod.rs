//! Output formatting for scan results

use crate::scanner::{ScanResult, StatsSnapshot};
use colored::*;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Renders one result per call, ready to print as it arrives
#[derive(Debug, Clone)]
pub struct ResultPrinter {
    format: OutputFormat,
    colored: bool,
}

impl ResultPrinter {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn render(&self, result: &ScanResult) -> String {
        match self.format {
            OutputFormat::Text => self.render_text(result),
            OutputFormat::Json => render_json(result),
        }
    }

    fn render_text(&self, result: &ScanResult) -> String {
        let protocol = result.protocol.as_deref().unwrap_or("unknown");
        let suite = result
            .cipher_suite
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("unknown");

        let mut out = if self.colored {
            format!(
                "{} {} {}",
                result.target.bright_cyan().bold(),
                protocol.bright_white(),
                suite.bright_yellow()
            )
        } else {
            format!("{} {} {}", result.target, protocol, suite)
        };

        if result.peer_certificates.is_empty() {
            out.push_str("\n    (no certificate presented)");
        }

        for (depth, cert) in result.peer_certificates.iter().enumerate() {
            let subject = if self.colored {
                cert.subject.bright_green().to_string()
            } else {
                cert.subject.clone()
            };
            out.push_str(&format!("\n    [{}] subject: {}", depth, subject));
            out.push_str(&format!("\n        issuer:  {}", cert.issuer));
            out.push_str(&format!("\n        valid:   {} -> {}", cert.not_before, cert.not_after));
            if !cert.dns_names.is_empty() {
                out.push_str(&format!("\n        dns:     {}", cert.dns_names.join(", ")));
            }
        }

        out
    }

    /// One-line summary printed after shutdown
    pub fn render_summary(&self, stats: &StatsSnapshot) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(stats).unwrap_or_default(),
            OutputFormat::Text => {
                let line = format!(
                    "{} targets, {} handshakes, {} failed dials, {} results ({:.1}% success)",
                    stats.targets_enqueued,
                    stats.handshakes,
                    stats.failures,
                    stats.delivered,
                    stats.success_rate()
                );
                if self.colored {
                    format!("{} {}", "[~]".bright_blue(), line)
                } else {
                    format!("[~] {}", line)
                }
            }
        }
    }
}

fn render_json(result: &ScanResult) -> String {
    match serde_json::to_string(result) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize result for {}: {}", result.target, e);
            String::new()
        }
    }
}
