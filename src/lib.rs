//! certsweep - concurrent TLS port scanner
//!
//! Enqueue `host:port` targets while the scan is running; each one is dialed
//! behind a concurrency gate, handshaken with verification disabled, and the
//! resulting connection metadata (peer chain, negotiated suite) is handed to
//! a single caller-supplied callback.
//!
//! ```no_run
//! use certsweep::{ScanConfig, Scanner};
//!
//! # async fn run() -> certsweep::Result<()> {
//! let scanner = Scanner::new(ScanConfig::default().with_max_parallel_dials(256), |result| {
//!     for cert in &result.peer_certificates {
//!         println!("{} {}", result.target, cert.subject);
//!     }
//! })?;
//!
//! for port in 1..1024 {
//!     scanner.enqueue(format!("example.com:{}", port))?;
//! }
//! scanner.close_and_await_termination().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::{DialError, ScanError};
pub use network::{CipherSuite, Dialer, PeerCertificate, TlsDialer};
pub use scanner::{ScanResult, Scanner, StatsSnapshot};

pub type Result<T> = std::result::Result<T, ScanError>;
