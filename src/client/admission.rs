//! Admission gate bounding in-flight requests.
//!
//! # Responsibilities
//! - Limit concurrent dispatches to the configured capacity
//! - Hand out RAII slots that release on drop, on every exit path
//! - Expose in-flight counts for diagnostics and metrics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Counting semaphore in front of the proxy connection.
///
/// Capacity is fixed at construction. Waiters are served in FIFO order
/// by the underlying Tokio semaphore.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    ///
    /// The slot is released when the returned guard is dropped.
    pub async fn acquire(&self) -> AdmissionSlot {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("admission semaphore is never closed");

        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_in_flight(in_flight);

        AdmissionSlot {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A held admission slot.
///
/// Dropping it returns the slot to the gate exactly once.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        let in_flight = self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_in_flight(in_flight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slots_released_on_drop() {
        let gate = AdmissionGate::new(2);
        assert_eq!(gate.capacity(), 2);

        let first = gate.acquire().await;
        let second = gate.acquire().await;
        assert_eq!(gate.available(), 0);
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        assert_eq!(gate.available(), 1);
        assert_eq!(gate.in_flight(), 1);

        drop(second);
        assert_eq!(gate.available(), 2);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_acquire_waits_when_full() {
        let gate = AdmissionGate::new(1);
        let held = gate.acquire().await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(blocked.is_err());

        drop(held);
        let slot = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(slot.is_ok());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        let _slot = gate.acquire().await;
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn test_slot_released_when_task_panics() {
        let gate = AdmissionGate::new(1);
        let task_gate = gate.clone();

        let result = tokio::spawn(async move {
            let _slot = task_gate.acquire().await;
            panic!("dispatch blew up");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(gate.available(), 1);
        assert_eq!(gate.in_flight(), 0);
    }
}
