//! Network module: the dialer seam and its TLS implementation

pub mod certificate;
pub mod cipher_suites;
pub mod tls;

use crate::error::DialError;
use crate::scanner::ScanResult;
use async_trait::async_trait;
use std::time::Duration;

pub use certificate::PeerCertificate;
pub use cipher_suites::CipherSuite;
pub use tls::TlsDialer;

/// Opens one connection to a target and reports what the handshake revealed.
///
/// Implementations must release the connection before returning on every
/// path and must not share mutable state between calls; the scanner invokes
/// `dial` from many tasks at once.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connect to `target` (`host:port`) and complete a single handshake,
    /// restricted to `cipher_suite` when one is given. `timeout` bounds the
    /// whole attempt.
    async fn dial(
        &self,
        target: &str,
        cipher_suite: Option<&'static CipherSuite>,
        timeout: Duration,
    ) -> Result<ScanResult, DialError>;
}
