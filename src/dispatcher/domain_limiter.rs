//! Per-domain concurrency limiter
//!
//! Many firms share one applicant-tracking host (`boards.greenhouse.io`,
//! `jobs.lever.co`, ...). The phase-wide cap alone would let every one of
//! them hit that host at once.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::error;

/// Lazily created semaphore per domain, shared by every task of a phase
pub struct DomainLimiter {
    domain_semaphores: DashMap<String, Arc<Semaphore>>,
    max_per_domain: usize,
}

impl DomainLimiter {
    /// # Arguments
    /// * `max_per_domain` - Maximum concurrent attempts against one domain (at least 1)
    #[must_use]
    pub fn new(max_per_domain: usize) -> Self {
        Self {
            domain_semaphores: DashMap::new(),
            max_per_domain: max_per_domain.max(1),
        }
    }

    #[must_use]
    pub fn max_per_domain(&self) -> usize {
        self.max_per_domain
    }

    /// Wait for a slot on `domain`; the slot is released when the permit drops
    pub async fn acquire(&self, domain: &str) -> OwnedSemaphorePermit {
        loop {
            let semaphore = self
                .domain_semaphores
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_domain)))
                .clone();

            match semaphore.acquire_owned().await {
                Ok(permit) => return permit,
                Err(_) => {
                    // Nothing closes these semaphores; swap in a fresh one and retry
                    error!(domain, "Domain semaphore was closed unexpectedly - replacing");
                    self.domain_semaphores.insert(
                        domain.to_string(),
                        Arc::new(Semaphore::new(self.max_per_domain)),
                    );
                }
            }
        }
    }
}
