//! TLS dialer built on OpenSSL
//!
//! Certificate verification is disabled on purpose: the scanner exists to
//! inspect whatever a server presents, including self-signed and expired
//! chains.

use crate::error::DialError;
use crate::network::certificate::PeerCertificate;
use crate::network::cipher_suites::{self, CipherSuite};
use crate::network::Dialer;
use crate::scanner::{NegotiatedCipher, ScanResult};
use async_trait::async_trait;
use openssl::ssl::{Ssl, SslConnector, SslMethod, SslRef, SslVerifyMode, SslVersion};
use std::net::IpAddr;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

/// Dialer performing one TCP connect and one TLS handshake per call
#[derive(Debug, Clone, Default)]
pub struct TlsDialer;

impl TlsDialer {
    pub fn new() -> Self {
        Self
    }

    /// Build a client session, optionally pinned to a single cipher suite
    fn client_session(&self, host: &str, suite: Option<&CipherSuite>) -> Result<Ssl, DialError> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;
        builder.set_verify(SslVerifyMode::NONE);

        if let Some(suite) = suite {
            if suite.tls13 {
                builder.set_min_proto_version(Some(SslVersion::TLS1_3))?;
                builder.set_ciphersuites(suite.openssl_name)?;
            } else {
                builder.set_max_proto_version(Some(SslVersion::TLS1_2))?;
                // Legacy suites sit below the default security level
                builder.set_cipher_list(&format!("{}:@SECLEVEL=0", suite.openssl_name))?;
            }
        }

        let ssl = builder
            .build()
            .configure()?
            .verify_hostname(false)
            .use_server_name_indication(host.parse::<IpAddr>().is_err())
            .into_ssl(host)?;
        Ok(ssl)
    }

    async fn handshake(
        &self,
        target: &str,
        suite: Option<&CipherSuite>,
    ) -> Result<ScanResult, DialError> {
        let tcp = TcpStream::connect(target).await.map_err(|source| DialError::Connect {
            target: target.to_string(),
            source,
        })?;
        let remote_addr = tcp.peer_addr().ok();

        let ssl = self.client_session(host_of(target), suite)?;
        let mut stream = SslStream::new(ssl, tcp)?;
        Pin::new(&mut stream)
            .connect()
            .await
            .map_err(|e| DialError::Handshake {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        log::debug!("Connection to {} established", target);

        let mut result = connection_state(target, stream.ssl())?;
        result.remote_addr = remote_addr;
        // Dropping the stream closes the socket
        Ok(result)
    }
}

#[async_trait]
impl Dialer for TlsDialer {
    async fn dial(
        &self,
        target: &str,
        cipher_suite: Option<&'static CipherSuite>,
        dial_timeout: Duration,
    ) -> Result<ScanResult, DialError> {
        match timeout(dial_timeout, self.handshake(target, cipher_suite)).await {
            Ok(result) => result,
            Err(_) => Err(DialError::Timeout {
                target: target.to_string(),
                timeout_ms: dial_timeout.as_millis(),
            }),
        }
    }
}

/// Read the negotiated parameters and the peer chain off a finished session
fn connection_state(target: &str, ssl: &SslRef) -> Result<ScanResult, DialError> {
    let mut result = ScanResult::new(target);
    result.protocol = Some(ssl.version_str().to_string());

    result.cipher_suite = ssl.current_cipher().map(|cipher| {
        let [hi, lo] = cipher.protocol_id();
        let id = u16::from_be_bytes([hi, lo]);
        let name = match cipher_suites::lookup(id) {
            Some(known) => known.name.to_string(),
            None => cipher
                .standard_name()
                .map(str::to_string)
                .unwrap_or_else(|| cipher.name().to_string()),
        };
        NegotiatedCipher { id, name }
    });

    if let Some(chain) = ssl.peer_cert_chain() {
        for cert in chain {
            result.peer_certificates.push(PeerCertificate::from_x509(cert)?);
        }
    } else if let Some(cert) = ssl.peer_certificate() {
        result.peer_certificates.push(PeerCertificate::from_x509(&cert)?);
    }

    Ok(result)
}

/// Host part of a `host:port` target, without IPv6 brackets
pub fn host_of(target: &str) -> &str {
    let host = match target.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => target,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}
