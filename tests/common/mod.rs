//! Simulated network shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use certsweep::{CipherSuite, DialError, Dialer, ScanResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a simulated host answers
#[derive(Debug, Clone)]
pub enum Host {
    /// TCP connect refused
    Closed,
    /// Completes any handshake, negotiating TLS_AES_128_GCM_SHA256
    Tls,
    /// Completes only handshakes restricted to one of these suite ids
    TlsSuites(Vec<u16>),
    /// Accepts TCP but fails every handshake
    PlainTcp,
}

/// Dialer answering from a fixed host table, instrumented for concurrency
pub struct SimulatedNetwork {
    hosts: HashMap<String, (Host, Duration)>,
    default_latency: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SimulatedNetwork {
    pub fn new(default_latency: Duration) -> Self {
        Self {
            hosts: HashMap::new(),
            default_latency,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn host(mut self, target: &str, host: Host) -> Self {
        self.hosts.insert(target.to_string(), (host, self.default_latency));
        self
    }

    pub fn host_with_latency(mut self, target: &str, host: Host, latency: Duration) -> Self {
        self.hosts.insert(target.to_string(), (host, latency));
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for SimulatedNetwork {
    async fn dial(
        &self,
        target: &str,
        cipher_suite: Option<&'static CipherSuite>,
        _timeout: Duration,
    ) -> Result<ScanResult, DialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (host, latency) = self
            .hosts
            .get(target)
            .cloned()
            .unwrap_or((Host::Closed, self.default_latency));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let refused = || DialError::Connect {
            target: target.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        let handshake_failed = || DialError::Handshake {
            target: target.to_string(),
            reason: "no shared cipher".to_string(),
        };

        match host {
            Host::Closed => Err(refused()),
            Host::PlainTcp => Err(handshake_failed()),
            Host::Tls => {
                let id = cipher_suite.map(|s| s.id).unwrap_or(0x1301);
                Ok(ScanResult::new(target).with_cipher_suite(id))
            }
            Host::TlsSuites(accepted) => match cipher_suite {
                Some(suite) if accepted.contains(&suite.id) => {
                    Ok(ScanResult::new(target).with_cipher_suite(suite.id))
                }
                Some(_) => Err(handshake_failed()),
                None => match accepted.first() {
                    Some(id) => Ok(ScanResult::new(target).with_cipher_suite(*id)),
                    None => Err(handshake_failed()),
                },
            },
        }
    }
}
