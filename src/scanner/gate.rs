//! Admission gate bounding concurrent dials
//!
//! A slot is held by a [`GateTicket`] and returned when the ticket drops, so
//! every exit path of a dial task releases exactly what it acquired.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting limiter shared by all dial tasks of a scanner
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    capacity: usize,
}

/// One admitted dial. Dropping it frees the slot.
#[derive(Debug)]
pub struct GateTicket {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    /// Wait until fewer than `capacity` dials are in flight
    pub async fn acquire(&self) -> GateTicket {
        // The semaphore is never closed
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("admission semaphore closed");

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        log::trace!("admitted dial ({} in flight)", now);

        GateTicket {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dials currently holding a ticket
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held tickets seen so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for GateTicket {
    fn drop(&mut self) {
        // Counter drops before the permit field is released
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
