use time::OffsetDateTime;
use tracing::debug;

use crate::error::AppError;
use crate::tasks::dto::TaskCommand;
use crate::tasks::repo::TaskRepo;
use crate::tasks::repo_types::Task;

const TASK_NOT_FOUND: AppError = AppError::NotFound("Task not found");
const NO_MATCHING_TASKS: AppError = AppError::NotFound("No matching tasks found");

pub async fn apply(repo: &dyn TaskRepo, owner_id: i64, cmd: TaskCommand) -> Result<Task, AppError> {
    match cmd {
        TaskCommand::Create(fields) => {
            let task = repo.create(owner_id, fields).await?;
            debug!(task_id = task.id, owner_id, "task created");
            Ok(task)
        }
        TaskCommand::FullEdit { id, fields, done } => repo
            .update_full(id, owner_id, fields, done)
            .await?
            .ok_or(TASK_NOT_FOUND),
        TaskCommand::SetDone { id, done } => repo
            .update_done_flag(id, owner_id, done)
            .await?
            .ok_or(TASK_NOT_FOUND),
    }
}

pub async fn toggle(repo: &dyn TaskRepo, owner_id: i64, task_id: i64) -> Result<Task, AppError> {
    repo.toggle_done(task_id, owner_id)
        .await?
        .ok_or(TASK_NOT_FOUND)
}

pub async fn delete(repo: &dyn TaskRepo, owner_id: i64, task_id: i64) -> Result<Task, AppError> {
    repo.delete(task_id, owner_id).await?.ok_or(TASK_NOT_FOUND)
}

/// `404` only when nothing at all matched.
pub async fn bulk_delete(
    repo: &dyn TaskRepo,
    owner_id: i64,
    ids: &[i64],
) -> Result<Vec<Task>, AppError> {
    let deleted = repo.bulk_delete(ids, owner_id).await?;
    if deleted.is_empty() {
        return Err(NO_MATCHING_TASKS);
    }
    debug!(owner_id, requested = ids.len(), deleted = deleted.len(), "bulk delete");
    Ok(deleted)
}

pub async fn bulk_complete(
    repo: &dyn TaskRepo,
    owner_id: i64,
    ids: &[i64],
    now: OffsetDateTime,
) -> Result<Vec<Task>, AppError> {
    let completed_at_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
    let updated = repo.bulk_complete(ids, owner_id, completed_at_ms).await?;
    if updated.is_empty() {
        return Err(NO_MATCHING_TASKS);
    }
    debug!(owner_id, requested = ids.len(), updated = updated.len(), "bulk complete");
    Ok(updated)
}
