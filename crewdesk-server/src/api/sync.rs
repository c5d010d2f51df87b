//! Directory and call-stats sync endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use crewdesk_common::{CallStats, StatsInterval, Worker};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::reconcile::{ItemError, StatsSyncResult};
use crate::services::wordpress_client::DirectoryUser;
use crate::services::{reconcile_directory, reconcile_stats, sync_all_stats, CallStatsError};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct IntervalQuery {
    pub interval: Option<String>,
}

impl IntervalQuery {
    /// Missing means a month; anything unrecognised is rejected
    pub fn resolve(&self) -> ApiResult<StatsInterval> {
        match self.interval.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(StatsInterval::default()),
            Some(raw) => StatsInterval::from_str(raw).ok_or_else(|| {
                let allowed: Vec<&str> = StatsInterval::all_variants()
                    .iter()
                    .map(StatsInterval::as_str)
                    .collect();
                ApiError::BadRequest(format!(
                    "Invalid interval '{}'. Expected one of: {}",
                    raw,
                    allowed.join(", ")
                ))
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WorkerSyncResponse {
    Synced {
        success: bool,
        worker: Worker,
        stats: CallStats,
    },
    AgentMissing {
        success: bool,
        worker: Worker,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct DirectorySyncResponse {
    pub success: bool,
    pub message: String,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub total: usize,
    pub errors: Vec<ItemError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConnectionResponse {
    pub connected: bool,
    pub employee_count: usize,
    pub employees: Vec<DirectoryUser>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsSyncResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<StatsSyncResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStatsConnectionResponse {
    pub connected: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// POST /api/workers/:id/sync?interval=
///
/// An agent missing upstream is not an error: the worker comes back
/// unchanged with an explanatory message.
pub async fn sync_worker_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<IntervalQuery>, QueryRejection>,
) -> ApiResult<Json<WorkerSyncResponse>> {
    let Query(query) = query?;
    let interval = query.resolve()?;

    let worker = state
        .store
        .get(&id)
        .await
        .ok_or_else(ApiError::worker_not_found)?;

    match state
        .call_stats
        .fetch_stats_for_member(&worker.email, interval)
        .await
    {
        Ok(agent_stats) => {
            let updated = reconcile_stats(&state.store, &id, agent_stats.counts)
                .await?
                .ok_or_else(ApiError::worker_not_found)?;
            info!(worker_id = %id, interval = %interval, "Worker stats synced");
            Ok(Json(WorkerSyncResponse::Synced {
                success: true,
                stats: updated.stats.clone(),
                worker: updated,
            }))
        }
        Err(CallStatsError::NotFound(email)) => {
            info!(worker_id = %id, email = %email, "No MyPhoner agent for worker");
            Ok(Json(WorkerSyncResponse::AgentMissing {
                success: true,
                worker,
                message: "Worker not found in MyPhoner or no data available".to_string(),
            }))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/myphoner/sync?interval=
pub async fn sync_all_worker_stats(
    State(state): State<AppState>,
    query: Result<Query<IntervalQuery>, QueryRejection>,
) -> ApiResult<Json<StatsSyncResponse>> {
    let Query(query) = query?;
    let interval = query.resolve()?;

    if !state.call_stats.is_configured() {
        return Err(CallStatsError::Configuration(
            "MyPhoner API key not configured".to_string(),
        )
        .into());
    }

    let results = sync_all_stats(&state.store, &state.call_stats, interval).await;
    let synced = results.iter().filter(|r| r.synced).count();

    Ok(Json(StatsSyncResponse {
        success: true,
        message: format!("Synced {} of {} workers", synced, results.len()),
        results,
    }))
}

/// GET /api/myphoner/test
pub async fn test_call_stats_connection(
    State(state): State<AppState>,
) -> Json<CallStatsConnectionResponse> {
    let response = match state.call_stats.test_connection().await {
        Ok(()) => CallStatsConnectionResponse {
            connected: true,
            last_sync: Some(Utc::now()),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "MyPhoner connection test failed");
            CallStatsConnectionResponse {
                connected: false,
                last_sync: None,
                error: Some(e.to_string()),
            }
        }
    };
    Json(response)
}

/// POST /api/wordpress/sync
pub async fn sync_directory(State(state): State<AppState>) -> ApiResult<Json<DirectorySyncResponse>> {
    // Credentials are checked before any network call
    if !state.directory.is_configured() {
        return Err(ApiError::BadRequest(
            "WordPress credentials not configured. Set WORDPRESS_USERNAME and WORDPRESS_APP_PASSWORD in the environment or the [directory] section of the config file.".to_string(),
        ));
    }

    if let Err(e) = state.directory.test_connection().await {
        warn!(error = %e, "WordPress connection test failed");
        return Err(ApiError::BadRequest(format!(
            "Could not connect to WordPress. Check that the WordPress URL is correct, the username and application password are valid, and the site allows REST API access. ({})",
            e
        )));
    }

    let members = state.directory.fetch_directory_members().await?;
    let report = reconcile_directory(
        &state.store,
        &members,
        state.directory.settings().prune_missing,
    )
    .await;

    Ok(Json(DirectorySyncResponse {
        success: true,
        message: report.message(),
        added: report.added,
        updated: report.updated,
        removed: report.removed,
        total: report.total,
        errors: report.errors,
    }))
}

/// GET /api/wordpress/test-connection
///
/// Always 200; failures are reported in the body.
pub async fn test_directory_connection(
    State(state): State<AppState>,
) -> Json<DirectoryConnectionResponse> {
    if let Err(e) = state.directory.test_connection().await {
        return Json(DirectoryConnectionResponse {
            connected: false,
            employee_count: 0,
            employees: Vec::new(),
            error: Some(e.to_string()),
        });
    }

    let response = match state.directory.fetch_role_users().await {
        Ok(users) => DirectoryConnectionResponse {
            connected: true,
            employee_count: users.len(),
            employees: users,
            error: None,
        },
        Err(e) => DirectoryConnectionResponse {
            connected: true,
            employee_count: 0,
            employees: Vec::new(),
            error: Some(e.to_string()),
        },
    };
    Json(response)
}

pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workers/:id/sync", post(sync_worker_stats))
        .route("/api/myphoner/sync", post(sync_all_worker_stats))
        .route("/api/myphoner/test", get(test_call_stats_connection))
        .route("/api/wordpress/sync", post(sync_directory))
        .route("/api/wordpress/test-connection", get(test_directory_connection))
}
