//! Store lease.
//!
//! Per-request ownership of one store handle:
//! `Unbound` -> `Bound` (acquired) -> `Released`. Once released the lease
//! refuses to hand the store out again; release itself is idempotent.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::store::{DocumentStore, StoreConnector, StoreError, StoreHandle, StoreResult};

/// Lifecycle phase of a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeasePhase {
    Unbound,
    Bound,
    Released,
}

enum LeaseState {
    Unbound,
    Bound(StoreHandle),
    Released,
}

/// One request's claim on a store handle
pub struct StoreLease {
    connector: Arc<dyn StoreConnector>,
    state: Mutex<LeaseState>,
}

impl StoreLease {
    /// Create an unbound lease against a connector
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            connector,
            state: Mutex::new(LeaseState::Unbound),
        }
    }

    /// Acquire a handle from the connector.
    ///
    /// Only valid from `Unbound`; a released lease cannot be rebound.
    pub async fn bind(&self) -> StoreResult<()> {
        if self.phase() != LeasePhase::Unbound {
            return Err(StoreError::Released);
        }

        let handle = self.connector.acquire().await?;

        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        if matches!(*state, LeaseState::Unbound) {
            *state = LeaseState::Bound(handle);
            debug!("store handle acquired");
            return Ok(());
        }

        // Released while acquiring
        drop(state);
        self.connector.release(handle);
        Err(StoreError::Released)
    }

    /// Acquire a handle and wrap it in a bound lease
    pub async fn acquire(connector: Arc<dyn StoreConnector>) -> StoreResult<Arc<Self>> {
        let lease = Arc::new(Self::new(connector));
        lease.bind().await?;
        Ok(lease)
    }

    /// The bound store
    pub fn store(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        match &*state {
            LeaseState::Bound(handle) => Ok(Arc::clone(handle)),
            LeaseState::Unbound => Err(StoreError::Unavailable(
                "store handle not acquired".to_string(),
            )),
            LeaseState::Released => Err(StoreError::Released),
        }
    }

    pub fn phase(&self) -> LeasePhase {
        match self.state.lock() {
            Ok(state) => match *state {
                LeaseState::Unbound => LeasePhase::Unbound,
                LeaseState::Bound(_) => LeasePhase::Bound,
                LeaseState::Released => LeasePhase::Released,
            },
            Err(_) => LeasePhase::Released,
        }
    }

    /// Give the handle back to the connector. Safe to call repeatedly.
    pub fn release(&self) {
        let previous = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, LeaseState::Released),
            Err(poisoned) => {
                std::mem::replace(&mut *poisoned.into_inner(), LeaseState::Released)
            }
        };

        if let LeaseState::Bound(handle) = previous {
            self.connector.release(handle);
            debug!("store handle released");
        }
    }
}

impl Drop for StoreLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StoreLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLease")
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Filter, MemoryConnector};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnector {
        inner: MemoryConnector,
        released: AtomicUsize,
    }

    impl StoreConnector for CountingConnector {
        fn acquire(&self) -> crate::store::StoreFuture<'_, StoreHandle> {
            self.inner.acquire()
        }

        fn release(&self, handle: StoreHandle) {
            self.released.fetch_add(1, Ordering::SeqCst);
            self.inner.release(handle);
        }
    }

    fn counting() -> Arc<CountingConnector> {
        Arc::new(CountingConnector {
            inner: MemoryConnector::new(),
            released: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let connector = counting();
        let lease = StoreLease::new(connector.clone());
        assert_eq!(lease.phase(), LeasePhase::Unbound);
        assert!(lease.store().is_err());

        lease.bind().await.unwrap();
        assert_eq!(lease.phase(), LeasePhase::Bound);
        let store = lease.store().unwrap();
        store.find("c", &Filter::All, None).await.unwrap();

        lease.release();
        assert_eq!(lease.phase(), LeasePhase::Released);
        assert!(matches!(lease.store(), Err(StoreError::Released)));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let connector = counting();
        let lease = StoreLease::acquire(connector.clone()).await.unwrap();
        lease.release();
        lease.release();
        drop(lease);
        assert_eq!(connector.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_bound_handle() {
        let connector = counting();
        {
            let _lease = StoreLease::acquire(connector.clone()).await.unwrap();
        }
        assert_eq!(connector.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_lease_cannot_rebind() {
        let lease = StoreLease::new(counting());
        lease.release();
        assert_eq!(lease.bind().await.unwrap_err(), StoreError::Released);
    }
}
