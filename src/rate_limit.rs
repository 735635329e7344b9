use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument};

/// Bounded gate on simultaneous upstream requests
///
/// NCBI E-utilities publish a per-client request policy:
/// - 3 requests per second without API key
/// - 10 requests per second with API key
/// - Violations can result in IP blocking
///
/// The gate caps in-flight requests at the same numbers. It is shared by
/// every clone of the client, so all concurrent operations draw from one pool.
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `limit` concurrent holders
    ///
    /// A limit of zero is raised to one so the gate can never deadlock.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_gateway::rate_limit::ConcurrencyGate;
    ///
    /// let gate = ConcurrencyGate::new(5);
    /// assert_eq!(gate.limit(), 5);
    /// ```
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Gate for NCBI without API key (3 concurrent requests)
    pub fn ncbi_default() -> Self {
        Self::new(3)
    }

    /// Gate for NCBI with API key (10 concurrent requests)
    pub fn ncbi_with_key() -> Self {
        Self::new(10)
    }

    /// Wait for a free slot
    ///
    /// The slot is released when the returned permit is dropped.
    #[instrument(skip(self), fields(limit = self.limit))]
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        debug!(available = self.semaphore.available_permits(), "Gate slot acquired");
        Ok(permit)
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured capacity
    pub fn limit(&self) -> usize {
        self.limit
    }
}
