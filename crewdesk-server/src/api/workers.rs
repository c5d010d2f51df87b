//! Worker CRUD, checklist and notes endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch},
    Json, Router,
};
use crewdesk_common::{Checklist, ChecklistKey, NewWorker, Note, Worker, WorkerPatch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// Author recorded on notes that do not name one
const DEFAULT_NOTE_AUTHOR: &str = "admin";

#[derive(Debug, Serialize)]
pub struct WorkersResponse {
    pub success: bool,
    pub workers: Vec<Worker>,
}

#[derive(Debug, Serialize)]
pub struct WorkerResponse {
    pub success: bool,
    pub worker: Worker,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistUpdate {
    pub key: String,
    pub value: bool,
}

#[derive(Debug, Serialize)]
pub struct ChecklistResponse {
    pub success: bool,
    pub checklist: Checklist,
}

#[derive(Debug, Deserialize)]
pub struct NewNote {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub success: bool,
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub success: bool,
    pub note: Note,
}

/// GET /api/workers
pub async fn list_workers(State(state): State<AppState>) -> Json<WorkersResponse> {
    Json(WorkersResponse {
        success: true,
        workers: state.store.list().await,
    })
}

/// POST /api/workers
///
/// Missing name or email is a 400; an email already on file is a 409.
pub async fn create_worker(
    State(state): State<AppState>,
    payload: Result<Json<NewWorker>, JsonRejection>,
) -> ApiResult<Json<WorkerResponse>> {
    let Json(input) = payload?;
    if input.name.trim().is_empty() || input.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Name and email are required".to_string()));
    }

    let worker = state.store.add(input).await?;
    Ok(Json(WorkerResponse {
        success: true,
        worker,
    }))
}

/// GET /api/workers/:id
pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkerResponse>> {
    let worker = state
        .store
        .get(&id)
        .await
        .ok_or_else(ApiError::worker_not_found)?;
    Ok(Json(WorkerResponse {
        success: true,
        worker,
    }))
}

/// PATCH /api/workers/:id
pub async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<WorkerPatch>, JsonRejection>,
) -> ApiResult<Json<WorkerResponse>> {
    let Json(patch) = payload?;
    let worker = state
        .store
        .update(&id, patch)
        .await?
        .ok_or_else(ApiError::worker_not_found)?;
    Ok(Json(WorkerResponse {
        success: true,
        worker,
    }))
}

/// DELETE /api/workers/:id
pub async fn delete_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.store.remove(&id).await? {
        return Err(ApiError::worker_not_found());
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// PATCH /api/workers/:id/checklist
///
/// Body `{"key": "<checklistKey>", "value": <bool>}`; sets exactly one item.
pub async fn set_checklist_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChecklistUpdate>, JsonRejection>,
) -> ApiResult<Json<ChecklistResponse>> {
    let Json(update) = payload?;
    let key = ChecklistKey::from_str(&update.key)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown checklist key: {}", update.key)))?;

    let worker = state
        .store
        .set_checklist_item(&id, key, update.value)
        .await?
        .ok_or_else(ApiError::worker_not_found)?;

    Ok(Json(ChecklistResponse {
        success: true,
        checklist: worker.checklist,
    }))
}

/// GET /api/workers/:id/notes
pub async fn list_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<NotesResponse>> {
    let worker = state
        .store
        .get(&id)
        .await
        .ok_or_else(ApiError::worker_not_found)?;
    Ok(Json(NotesResponse {
        success: true,
        notes: worker.notes,
    }))
}

/// POST /api/workers/:id/notes
pub async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewNote>, JsonRejection>,
) -> ApiResult<Json<NoteResponse>> {
    let Json(input) = payload?;
    let content = input.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    let author = input
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_NOTE_AUTHOR);

    let note = state
        .store
        .append_note(&id, content, author)
        .await?
        .ok_or_else(ApiError::worker_not_found)?;

    info!(worker_id = %id, note_id = %note.id, "Note added");
    Ok(Json(NoteResponse {
        success: true,
        note,
    }))
}

pub fn worker_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workers", get(list_workers).post(create_worker))
        .route(
            "/api/workers/:id",
            get(get_worker).patch(update_worker).delete(delete_worker),
        )
        .route("/api/workers/:id/checklist", patch(set_checklist_item))
        .route("/api/workers/:id/notes", get(list_notes).post(add_note))
}
