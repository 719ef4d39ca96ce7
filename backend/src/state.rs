//! Application state management
//!
//! Shared state handed to every request handler through Axum's state
//! extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys, the DB pool and the
//!    Redis connection manager are created once at startup
//! 2. **Cheap cloning**: every field is an `Arc` or a handle around one
//! 3. **Shared plan cache**: clones of the state see the same cached plans,
//!    so an eviction in one handler is visible to all others

use crate::auth::JwtService;
use crate::cache::PlanCache;
use crate::config::AppConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// JWT service with keys derived at startup
    pub jwt: JwtService,
    /// Generated plans per user
    pub plans: PlanCache,
    /// Prometheus renderer, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create the application state
    ///
    /// `redis` is `None` when Redis is unreachable; the plan cache then keeps
    /// plans in process memory.
    pub fn new(db: PgPool, redis: Option<ConnectionManager>, config: AppConfig) -> Self {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry_secs);
        let plans = PlanCache::new(redis, config.planner.plan_cache_ttl_secs);

        Self {
            db,
            config: Arc::new(config),
            jwt,
            plans,
            metrics: None,
        }
    }

    /// Attach the installed Prometheus recorder
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }
}
