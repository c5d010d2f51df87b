//! crewdesk-server library interface
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::services::{AccountingClient, CallStatsClient, DirectoryClient};
use crate::store::WorkerStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WorkerStore>,
    pub directory: Arc<DirectoryClient>,
    pub call_stats: Arc<CallStatsClient>,
    pub accounting: Arc<AccountingClient>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build the integration clients from `config` around an opened store
    pub fn new(store: WorkerStore, config: ServiceConfig) -> ApiResult<Self> {
        let directory = DirectoryClient::new(config.directory.clone(), config.http_timeout)?;
        let call_stats = CallStatsClient::new(config.call_stats.clone(), config.http_timeout)?;
        let accounting = AccountingClient::new(config.accounting.clone(), config.http_timeout)?;

        Ok(Self {
            store: Arc::new(store),
            directory: Arc::new(directory),
            call_stats: Arc::new(call_stats),
            accounting: Arc::new(accounting),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::worker_routes())
        .merge(api::sync_routes())
        .merge(api::dashboard_routes())
        .merge(api::accounting_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
