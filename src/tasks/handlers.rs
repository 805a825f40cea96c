use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::{AuthContext, AuthUser},
    error::AppError,
    state::AppState,
};

use super::dto::{
    BulkCompleteResponse, BulkDeleteResponse, BulkIdsRequest, ListTasksQuery, SuccessResponse,
    TaskIdRequest, UpsertTaskRequest,
};
use super::repo_types::Task;
use super::services;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/api/tasks", get(list_tasks))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", post(upsert_task).delete(delete_task))
        .route("/api/tasks/toggle", post(toggle_task))
        .route("/api/tasks/bulk", delete(bulk_delete))
        .route("/api/tasks/bulk-toggle-done", post(bulk_complete))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "rejected request body");
        AppError::Validation(e.body_text())
    })
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params.map(|Query(v)| v).map_err(|e| {
        warn!(error = %e, "rejected query string");
        AppError::Validation(e.body_text())
    })
}

/// Owner comes from `?userId=`. Unless the legacy mode is configured, a live
/// session for that same user is also required.
#[instrument(skip(state, auth))]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    params: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, AppError> {
    let owner_id = query(params)?.owner()?;

    if state.config.tasks_list_legacy_query_auth {
        if auth.user_id() != Some(owner_id) {
            warn!(owner_id, caller = ?auth.user_id(), "task list served on query userId alone");
        }
    } else if auth.require()? != owner_id {
        return Err(AppError::NotFound("Tasks not found"));
    }

    let tasks = state.tasks.list_by_owner(owner_id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, payload))]
pub async fn upsert_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpsertTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let cmd = body(payload)?.into_command()?;
    let task = services::apply(state.tasks.as_ref(), user_id, cmd).await?;
    Ok(Json(task))
}

#[instrument(skip(state, payload))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<TaskIdRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let TaskIdRequest { id } = body(payload)?;
    services::delete(state.tasks.as_ref(), user_id, id).await?;
    info!(task_id = id, user_id, "task deleted");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state, payload))]
pub async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<TaskIdRequest>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let TaskIdRequest { id } = body(payload)?;
    let task = services::toggle(state.tasks.as_ref(), user_id, id).await?;
    Ok(Json(task))
}

#[instrument(skip(state, payload))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BulkIdsRequest>, JsonRejection>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let ids = body(payload)?.non_empty()?;
    let deleted = services::bulk_delete(state.tasks.as_ref(), user_id, &ids).await?;
    info!(user_id, deleted = deleted.len(), "tasks bulk deleted");
    Ok(Json(BulkDeleteResponse {
        success: true,
        deleted_count: deleted.len(),
        deleted_tasks: deleted,
    }))
}

#[instrument(skip(state, payload))]
pub async fn bulk_complete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BulkIdsRequest>, JsonRejection>,
) -> Result<Json<BulkCompleteResponse>, AppError> {
    let ids = body(payload)?.non_empty()?;
    let updated =
        services::bulk_complete(state.tasks.as_ref(), user_id, &ids, OffsetDateTime::now_utc())
            .await?;
    Ok(Json(BulkCompleteResponse {
        success: true,
        updated_count: updated.len(),
        updated_tasks: updated,
    }))
}
