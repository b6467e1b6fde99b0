//! # HTTP Server
//!
//! Wires the database routes behind the connection-scoping middleware,
//! adds CORS and request tracing, and serves the result.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::scope::{bind_database, ScopeState};
use crate::store::{MemoryConnector, StoreConnector};

use super::config::{ConfigError, ShimConfig, StoreKind};
use super::routes::{database_routes, health_routes, DATABASE_PREFIX};

/// Build the store connector named by the configuration
pub fn connector_for(config: &ShimConfig) -> Result<Arc<dyn StoreConnector>, ConfigError> {
    match config.store {
        StoreKind::Memory => Ok(Arc::new(MemoryConnector::new())),
        #[cfg(feature = "mongo")]
        StoreKind::Mongo => Ok(Arc::new(crate::store::MongoConnector::new(
            config.db_url.clone(),
            config.db_name.clone(),
        ))),
        #[cfg(not(feature = "mongo"))]
        StoreKind::Mongo => Err(ConfigError::Invalid(
            "store 'mongo' requires building with the `mongo` feature".to_string(),
        )),
    }
}

/// HTTP server for the database shim
pub struct ShimServer {
    config: ShimConfig,
    router: Router,
}

impl ShimServer {
    /// Create a server with the connector named by the configuration
    pub fn with_config(config: ShimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let connector = connector_for(&config)?;
        Ok(Self::with_connector(config, connector))
    }

    /// Create a server over an explicit connector
    pub fn with_connector(config: ShimConfig, connector: Arc<dyn StoreConnector>) -> Self {
        let router = Self::build_router(&config, connector);
        Self { config, router }
    }

    fn build_router(config: &ShimConfig, connector: Arc<dyn StoreConnector>) -> Router {
        let scope = ScopeState::new(connector)
            .with_timeout(config.request_timeout())
            .with_legacy_key_fallback(config.legacy_key_fallback);

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            // Handles are only acquired for matched database routes
            .merge(
                database_routes()
                    .route_layer(middleware::from_fn_with_state(scope, bind_database)),
            )
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;

        info!(
            addr = %addr,
            store = ?self.config.store,
            db_name = %self.config.db_name,
            "server listening"
        );
        info!("database API at http://{}{}", addr, DATABASE_PREFIX);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let server = ShimServer::with_config(ShimConfig::default()).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = ShimServer::with_config(ShimConfig::with_port(8080)).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ShimConfig {
            db_name: String::new(),
            ..Default::default()
        };
        assert!(ShimServer::with_config(config).is_err());
    }

    #[test]
    fn test_router_builds_with_origins() {
        let config = ShimConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..Default::default()
        };
        let _router = ShimServer::with_config(config).unwrap().router();
    }
}
