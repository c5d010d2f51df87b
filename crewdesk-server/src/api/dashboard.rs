//! Dashboard endpoint

use axum::{extract::State, routing::get, Json, Router};
use crewdesk_common::{time, Worker};
use serde::Serialize;

use crate::services::{compute_dashboard_stats, DashboardStats};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
    pub workers: Vec<Worker>,
}

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let workers = state.store.list().await;
    let stats = compute_dashboard_stats(&workers, time::today());

    Json(DashboardResponse {
        success: true,
        stats,
        workers,
    })
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}
