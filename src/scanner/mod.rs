//! Scanner module containing the scanning engine and its result types

pub mod engine;
pub mod gate;

use crate::network::PeerCertificate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

pub use engine::{AcceptFn, Scanner};
pub use gate::{AdmissionGate, GateTicket};

/// Cipher suite a server settled on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedCipher {
    /// IANA identifier
    pub id: u16,
    pub name: String,
}

/// Metadata captured from one successful handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Target as it was enqueued
    pub target: String,

    /// Address the TCP connection actually reached
    pub remote_addr: Option<SocketAddr>,

    /// Negotiated protocol version, e.g. `TLSv1.3`
    pub protocol: Option<String>,

    pub cipher_suite: Option<NegotiatedCipher>,

    /// Chain as sent by the server, leaf first
    pub peer_certificates: Vec<PeerCertificate>,

    pub observed_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            remote_addr: None,
            protocol: None,
            cipher_suite: None,
            peer_certificates: Vec::new(),
            observed_at: Utc::now(),
        }
    }

    /// Tag the result with a negotiated suite
    pub fn with_cipher_suite(mut self, id: u16) -> Self {
        self.cipher_suite = Some(NegotiatedCipher {
            id,
            name: crate::network::cipher_suites::name_of(id),
        });
        self
    }

    /// Leaf certificate, if the server sent one
    pub fn leaf(&self) -> Option<&PeerCertificate> {
        self.peer_certificates.first()
    }
}

/// Scan statistics shared between the facade and its tasks
#[derive(Debug, Default)]
pub struct ScanStats {
    targets_enqueued: AtomicU64,
    tasks_spawned: AtomicU64,
    handshakes: AtomicU64,
    failures: AtomicU64,
    delivered: AtomicU64,
}

/// Point-in-time copy of [`ScanStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub targets_enqueued: u64,
    pub tasks_spawned: u64,
    pub handshakes: u64,
    pub failures: u64,
    pub delivered: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self, tasks: u64) {
        self.targets_enqueued.fetch_add(1, Ordering::Relaxed);
        self.tasks_spawned.fetch_add(tasks, Ordering::Relaxed);
    }

    pub(crate) fn record_handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            targets_enqueued: self.targets_enqueued.load(Ordering::Relaxed),
            tasks_spawned: self.tasks_spawned.load(Ordering::Relaxed),
            handshakes: self.handshakes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Share of dial tasks that completed a handshake, in percent
    pub fn success_rate(&self) -> f64 {
        let finished = self.handshakes + self.failures;
        if finished > 0 {
            (self.handshakes as f64 / finished as f64) * 100.0
        } else {
            0.0
        }
    }
}
