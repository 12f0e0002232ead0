//! Main scanning engine implementation
//!
//! Every enqueued target becomes one dial task (or one per cipher suite when
//! enumerating). Tasks pass through the [`AdmissionGate`], are registered
//! with a [`TaskTracker`] before they run, and push successful handshakes
//! into a bounded channel drained by a single consumer task that owns the
//! caller's accept callback.
//!
//! Shutdown order: leave `Open` (which drops the facade's only way to spawn
//! work or clone a sender), wait for the tracker to drain, drop the facade's
//! sender so the channel closes once the last task has finished sending, then
//! wait for the consumer to report that it has drained everything. The
//! sequence runs as its own task and publishes completion on a watch channel.

use crate::config::ScanConfig;
use crate::network::{cipher_suites, CipherSuite, Dialer, TlsDialer};
use crate::scanner::gate::AdmissionGate;
use crate::scanner::{ScanResult, ScanStats, StatsSnapshot};
use crate::ScanError;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Callback receiving each result; invoked from one task, never concurrently
pub type AcceptFn = Box<dyn FnMut(ScanResult) + Send + 'static>;

enum Lifecycle {
    Open {
        results: mpsc::Sender<ScanResult>,
        consumer: JoinHandle<u64>,
    },
    Closing,
    Closed,
}

/// Concurrent TLS scanner accepting targets while it runs
pub struct Scanner {
    config: ScanConfig,
    dialer: Arc<dyn Dialer>,
    gate: AdmissionGate,
    tracker: TaskTracker,
    lifecycle: Arc<Mutex<Lifecycle>>,
    terminated: Arc<watch::Sender<bool>>,
    stats: Arc<ScanStats>,
    runtime: Handle,
    started: Instant,
}

impl Scanner {
    /// Create a scanner dialing real TLS endpoints.
    ///
    /// Must be called from within a tokio runtime; dial tasks and the
    /// consumer are spawned onto it.
    pub fn new<F>(config: ScanConfig, accept: F) -> crate::Result<Self>
    where
        F: FnMut(ScanResult) + Send + 'static,
    {
        Self::with_dialer(config, Arc::new(TlsDialer::new()), accept)
    }

    /// Create a scanner with a custom [`Dialer`]
    pub fn with_dialer<F>(config: ScanConfig, dialer: Arc<dyn Dialer>, accept: F) -> crate::Result<Self>
    where
        F: FnMut(ScanResult) + Send + 'static,
    {
        config.validate()?;

        let runtime = Handle::try_current().map_err(|e| {
            ScanError::RuntimeError(format!("scanner must be created inside a tokio runtime: {}", e))
        })?;

        let (results, receiver) = mpsc::channel(config.result_buffer);
        let stats = Arc::new(ScanStats::new());
        let consumer = runtime.spawn(consume(receiver, Box::new(accept), stats.clone()));
        let (terminated, _) = watch::channel(false);

        log::debug!(
            "scanner started (gate capacity {}, timeout {:?}, cipher enumeration {})",
            config.gate_capacity(),
            config.timeout_duration(),
            config.enumerate_cipher_suites
        );

        Ok(Self {
            gate: AdmissionGate::new(config.gate_capacity()),
            config,
            dialer,
            tracker: TaskTracker::new(),
            lifecycle: Arc::new(Mutex::new(Lifecycle::Open { results, consumer })),
            terminated: Arc::new(terminated),
            stats,
            runtime,
            started: Instant::now(),
        })
    }

    /// Start scanning `target` (`host:port`) in the background.
    ///
    /// Never waits on the network; admission happens inside the spawned
    /// task. Fails with [`ScanError::AlreadyClosed`] once shutdown has begun.
    pub fn enqueue(&self, target: impl Into<String>) -> crate::Result<()> {
        let lifecycle = lock(&self.lifecycle);
        let results = match &*lifecycle {
            Lifecycle::Open { results, .. } => results,
            Lifecycle::Closing | Lifecycle::Closed => return Err(ScanError::AlreadyClosed),
        };

        let target = target.into();
        let suites: Vec<Option<&'static CipherSuite>> = if self.config.enumerate_cipher_suites {
            cipher_suites::all().iter().map(Some).collect()
        } else {
            vec![None]
        };
        self.stats.record_enqueued(suites.len() as u64);

        for cipher_suite in suites {
            let task = ScanTask {
                target: target.clone(),
                cipher_suite,
                timeout: self.config.timeout_duration(),
            };
            // Registered with the tracker before the task can run
            self.tracker.spawn_on(
                task.run(
                    self.dialer.clone(),
                    self.gate.clone(),
                    results.clone(),
                    self.stats.clone(),
                ),
                &self.runtime,
            );
        }

        Ok(())
    }

    /// Stop accepting targets and wait until every enqueued scan has
    /// finished and every result has been handed to the accept callback.
    ///
    /// Safe to call repeatedly and concurrently: the first call starts the
    /// shutdown sequence as its own task, and every call waits for that task
    /// to publish termination. Dropping a call early (for instance under an
    /// external deadline) leaves shutdown running, so later calls still
    /// return. A panic raised by the accept callback resurfaces here, in the
    /// first caller.
    pub async fn close_and_await_termination(&self) {
        let open = {
            let mut lifecycle = lock(&self.lifecycle);
            match std::mem::replace(&mut *lifecycle, Lifecycle::Closing) {
                Lifecycle::Open { results, consumer } => Some((results, consumer)),
                other => {
                    *lifecycle = other;
                    None
                }
            }
        };

        let Some((results, consumer)) = open else {
            self.await_terminated().await;
            return;
        };

        log::debug!("closing scanner, waiting for {} dial tasks", self.tracker.len());
        let shutdown = Shutdown {
            tracker: self.tracker.clone(),
            lifecycle: self.lifecycle.clone(),
            terminated: self.terminated.clone(),
            stats: self.stats.clone(),
            started: self.started,
        };

        match self.runtime.spawn(shutdown.run(results, consumer)).await {
            Ok(None) => {}
            Ok(Some(panic)) => std::panic::resume_unwind(panic),
            Err(e) => {
                // Runtime is going away; nothing left to drain into
                log::warn!("shutdown task did not finish: {}", e);
                publish_closed(&self.lifecycle, &self.terminated);
            }
        }
    }

    async fn await_terminated(&self) {
        let mut terminated = self.terminated.subscribe();
        let _ = terminated.wait_for(|done| *done).await;
    }

    /// Dial tasks that have been spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// True once shutdown has begun
    pub fn is_closed(&self) -> bool {
        !matches!(*lock(&self.lifecycle), Lifecycle::Open { .. })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Dials currently admitted through the gate
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Highest number of concurrent dials observed
    pub fn peak_in_flight(&self) -> usize {
        self.gate.peak()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn publish_closed(lifecycle: &Mutex<Lifecycle>, terminated: &watch::Sender<bool>) {
    *lock(lifecycle) = Lifecycle::Closed;
    terminated.send_replace(true);
}

/// Shutdown sequence, detached from whichever caller started it
struct Shutdown {
    tracker: TaskTracker,
    lifecycle: Arc<Mutex<Lifecycle>>,
    terminated: Arc<watch::Sender<bool>>,
    stats: Arc<ScanStats>,
    started: Instant,
}

impl Shutdown {
    /// Returns the accept callback's panic payload, if it panicked
    async fn run(
        self,
        results: mpsc::Sender<ScanResult>,
        consumer: JoinHandle<u64>,
    ) -> Option<Box<dyn Any + Send>> {
        self.tracker.close();
        self.tracker.wait().await;

        // Tasks are done, so this is the last sender and the channel closes
        drop(results);
        let outcome = consumer.await;

        publish_closed(&self.lifecycle, &self.terminated);

        match outcome {
            Ok(delivered) => {
                let stats = self.stats.snapshot();
                log::info!(
                    "scan finished in {:?}: {} targets, {} handshakes, {} failures, {} results delivered",
                    self.started.elapsed(),
                    stats.targets_enqueued,
                    stats.handshakes,
                    stats.failures,
                    delivered
                );
                None
            }
            Err(e) if e.is_panic() => {
                log::error!("accept callback panicked, undelivered results were dropped");
                Some(e.into_panic())
            }
            Err(e) => {
                log::warn!("result consumer stopped early: {}", e);
                None
            }
        }
    }
}

/// One unit of work, owned by its task until the dial finishes
struct ScanTask {
    target: String,
    cipher_suite: Option<&'static CipherSuite>,
    timeout: Duration,
}

impl ScanTask {
    async fn run(
        self,
        dialer: Arc<dyn Dialer>,
        gate: AdmissionGate,
        results: mpsc::Sender<ScanResult>,
        stats: Arc<ScanStats>,
    ) {
        let outcome = {
            let _ticket = gate.acquire().await;
            dialer.dial(&self.target, self.cipher_suite, self.timeout).await
        };

        match outcome {
            Ok(result) => {
                stats.record_handshake();
                // Blocks while the channel is full
                if results.send(result).await.is_err() {
                    log::warn!("result consumer gone, dropping result for {}", self.target);
                }
            }
            Err(e) => {
                stats.record_failure();
                match self.cipher_suite {
                    Some(suite) => log::debug!("{} [{}]: {}", self.target, suite.name, e),
                    None => log::debug!("{}", e),
                }
            }
        }
    }
}

async fn consume(
    mut results: mpsc::Receiver<ScanResult>,
    mut accept: AcceptFn,
    stats: Arc<ScanStats>,
) -> u64 {
    let mut delivered = 0;
    while let Some(result) = results.recv().await {
        accept(result);
        delivered += 1;
        stats.record_delivered();
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DialError;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Dialer for Unreachable {
        async fn dial(
            &self,
            target: &str,
            _cipher_suite: Option<&'static CipherSuite>,
            timeout: Duration,
        ) -> Result<ScanResult, DialError> {
            Err(DialError::Timeout {
                target: target.to_string(),
                timeout_ms: timeout.as_millis(),
            })
        }
    }

    #[test]
    fn test_requires_runtime() {
        let result = Scanner::with_dialer(ScanConfig::default(), Arc::new(Unreachable), |_| {});
        assert!(matches!(result, Err(ScanError::RuntimeError(_))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = ScanConfig::default().with_max_parallel_dials(0);
        let result = Scanner::with_dialer(config, Arc::new(Unreachable), |_| {});
        assert!(matches!(result, Err(ScanError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let scanner = Scanner::with_dialer(ScanConfig::default(), Arc::new(Unreachable), |_| {
            panic!("no result expected")
        })
        .unwrap();

        assert!(!scanner.is_closed());
        scanner.enqueue("closed:1").unwrap();
        scanner.close_and_await_termination().await;

        assert!(scanner.is_closed());
        assert!(matches!(scanner.enqueue("closed:2"), Err(ScanError::AlreadyClosed)));

        let stats = scanner.stats();
        assert_eq!(stats.targets_enqueued, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.delivered, 0);
        assert_eq!(scanner.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_enumeration_spawns_one_task_per_suite() {
        let config = ScanConfig::default().with_cipher_enumeration(true);
        let scanner = Scanner::with_dialer(config, Arc::new(Unreachable), |_| {}).unwrap();

        scanner.enqueue("host:443").unwrap();
        scanner.close_and_await_termination().await;

        let stats = scanner.stats();
        assert_eq!(stats.tasks_spawned, cipher_suites::all().len() as u64);
        assert_eq!(stats.failures, cipher_suites::all().len() as u64);
    }
}
