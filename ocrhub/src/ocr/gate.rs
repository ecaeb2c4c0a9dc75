use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{OcrHubError, Result};

/// Counting semaphore that bounds simultaneous engine invocations.
///
/// Callers beyond the capacity suspend until a permit frees. With a queue
/// timeout configured, a caller that waits longer than that gets
/// [`OcrHubError::QueueTimeout`] instead.
#[derive(Clone)]
pub struct OcrGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    queue_timeout: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Held for the duration of one engine invocation.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OcrGate {
    pub fn new(capacity: usize, queue_timeout: Option<Duration>) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            queue_timeout,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn acquire(&self) -> Result<GatePermit> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let permit = match self.queue_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire).await.map_err(|_| {
                OcrHubError::QueueTimeout {
                    waited_secs: limit.as_secs(),
                }
            })?,
            None => acquire.await,
        }
        .map_err(|_| OcrHubError::Internal("OCR gate closed".to_string()))?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent invocations observed since startup.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let gate = OcrGate::new(5, None);
        let mut handles = Vec::new();

        for _ in 0..20 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                assert!(gate.in_flight() <= 5);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(gate.peak() <= 5);
        assert!(gate.peak() >= 1);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.available_permits(), 5);
    }

    #[tokio::test]
    async fn test_excess_callers_wait_instead_of_failing() {
        let gate = OcrGate::new(1, None);
        let first = gate.acquire().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!waiter.is_finished());

        drop(first);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_queue_timeout_rejects_long_waits() {
        let gate = OcrGate::new(1, Some(Duration::from_millis(20)));
        let _held = gate.acquire().await.unwrap();

        let result = gate.acquire().await;
        assert!(matches!(result, Err(OcrHubError::QueueTimeout { .. })));
        assert_eq!(gate.in_flight(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let gate = OcrGate::new(0, None);
        assert_eq!(gate.capacity(), 1);
    }
}
