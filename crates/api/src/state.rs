//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ApiConfig;
use crate::db::Database;
use crate::services::auth::JwtKeys;
use crate::services::product_cache::ProductCache;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    db: Database,
    jwt: JwtKeys,
    product_cache: ProductCache,
    started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, db: Database) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                jwt,
                product_cache: ProductCache::new(),
                started_at: Instant::now(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get the access-token keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Get the catalogue read cache.
    #[must_use]
    pub fn product_cache(&self) -> &ProductCache {
        &self.inner.product_cache
    }

    /// Time since the state was built.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
