//! Connection-scoping middleware.
//!
//! Wraps every database route: acquire a handle, bind a [`Database`] into
//! the request's extensions, run the route (bounded by the configured
//! timeout), then release the handle whatever the route returned.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, error, warn};

use crate::database::Database;
use crate::store::StoreConnector;

use super::context::RequestScope;
use super::errors::ScopeError;
use super::lease::StoreLease;

/// Middleware state
#[derive(Clone)]
pub struct ScopeState {
    connector: Arc<dyn StoreConnector>,
    timeout: Option<Duration>,
    legacy_key_fallback: bool,
}

impl ScopeState {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            connector,
            timeout: None,
            legacy_key_fallback: false,
        }
    }

    /// Bound how long a route may hold its handle
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_legacy_key_fallback(mut self, enabled: bool) -> Self {
        self.legacy_key_fallback = enabled;
        self
    }
}

/// Bind a request-scoped [`Database`] around the downstream handler
pub async fn bind_database(
    State(state): State<ScopeState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ScopeError> {
    let lease = match StoreLease::acquire(Arc::clone(&state.connector)).await {
        Ok(lease) => lease,
        Err(err) => {
            error!(
                error = %err,
                connectivity = err.is_connectivity(),
                path = %request.uri().path(),
                "database handle acquisition failed"
            );
            return Err(ScopeError::Acquisition(err));
        }
    };

    let database =
        Database::new(Arc::clone(&lease)).with_legacy_key_fallback(state.legacy_key_fallback);
    let scope = RequestScope::new(database);
    debug!(request_id = %scope.request_id(), "database bound");

    if let Some(previous) = request.extensions_mut().insert(scope) {
        // Rebinding replaces the old scope; its handle goes back first
        debug!(request_id = %previous.request_id(), "replacing existing database binding");
        previous.release();
    }

    let outcome = match state.timeout {
        Some(timeout) => tokio::time::timeout(timeout, next.run(request))
            .await
            .map_err(|_| {
                warn!(timeout_ms = timeout.as_millis() as u64, "request timed out");
                ScopeError::Timeout(timeout)
            }),
        None => Ok(next.run(request).await),
    };

    lease.release();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::LeasePhase;
    use crate::store::{MemoryConnector, StoreError, StoreFuture, StoreHandle};
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct DownConnector;

    impl StoreConnector for DownConnector {
        fn acquire(&self) -> StoreFuture<'_, StoreHandle> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".to_string())) })
        }

        fn release(&self, _handle: StoreHandle) {}
    }

    fn app(state: ScopeState, seen: Arc<Mutex<Vec<RequestScope>>>) -> Router {
        Router::new()
            .route(
                "/",
                get(move |Extension(scope): Extension<RequestScope>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(scope);
                        "ok"
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(state, bind_database))
    }

    fn request() -> Request {
        axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_binds_and_releases() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = ScopeState::new(Arc::new(MemoryConnector::new()));

        let response = app(state, seen.clone()).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].database().lease().phase(), LeasePhase::Released);
    }

    #[tokio::test]
    async fn test_acquisition_failure_skips_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = ScopeState::new(Arc::new(DownConnector));

        let response = app(state, seen.clone()).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_binding_is_replaced_and_released() {
        let connector = Arc::new(MemoryConnector::new());
        let stale_lease = StoreLease::acquire(connector.clone()).await.unwrap();
        let stale = RequestScope::new(Database::new(stale_lease.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut req = request();
        req.extensions_mut().insert(stale.clone());

        let response = app(ScopeState::new(connector), seen.clone())
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(stale_lease.phase(), LeasePhase::Released);
        let seen = seen.lock().unwrap();
        assert_ne!(seen[0].request_id(), stale.request_id());
    }

    #[tokio::test]
    async fn test_timeout_releases_handle() {
        let state = ScopeState::new(Arc::new(MemoryConnector::new()))
            .with_timeout(Duration::from_millis(20));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let app = Router::new()
            .route(
                "/",
                get(move |Extension(scope): Extension<RequestScope>| {
                    let recorder = recorder.clone();
                    async move {
                        recorder.lock().unwrap().push(scope);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        "late"
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(state, bind_database));

        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            seen.lock().unwrap()[0].database().lease().phase(),
            LeasePhase::Released
        );
    }
}
