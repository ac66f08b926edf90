//! Admission control for concurrent transfers
//!
//! A counting semaphore with one permit per transfer slot. The dispatcher takes
//! an owned permit before spawning a worker; the worker holds it until its item
//! finishes, so at most `capacity` items are ever between admission and
//! completion.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded admission gate
#[derive(Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` holders (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, AdmissionError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AdmissionError::Closed(e.to_string()))
    }

    /// Configured number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Admission errors
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// The gate was closed while waiting
    #[error("admission gate closed: {0}")]
    Closed(String),
}
