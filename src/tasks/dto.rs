use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::AppError;
use crate::tasks::repo_types::{due_date, Task, TaskFields};

/// Raw body of `POST /api/tasks`. Which operation it means depends on which
/// fields are present; see [`UpsertTaskRequest::into_command`].
#[derive(Debug, Default, Deserialize)]
pub struct UpsertTaskRequest {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub prio: Option<String>,
    #[serde(default, deserialize_with = "due_date::deserialize")]
    pub due: Option<Date>,
    pub tags: Option<Vec<String>>,
    pub done: Option<bool>,
}

/// The typed operation behind an upsert body, decided once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskCommand {
    Create(TaskFields),
    FullEdit {
        id: i64,
        fields: TaskFields,
        done: Option<bool>,
    },
    SetDone {
        id: i64,
        done: bool,
    },
}

impl UpsertTaskRequest {
    fn has_edit_fields(&self) -> bool {
        self.title.is_some()
            || self.desc.is_some()
            || self.prio.is_some()
            || self.due.is_some()
            || self.tags.is_some()
    }

    /// - `id` + `done` and nothing else: flag-only update
    /// - `id` + any editable field: full edit
    /// - no `id`: create
    pub fn into_command(self) -> Result<TaskCommand, AppError> {
        match (self.id, self.done) {
            (Some(id), Some(done)) if !self.has_edit_fields() => Ok(TaskCommand::SetDone { id, done }),
            (Some(id), done) => Ok(TaskCommand::FullEdit {
                id,
                fields: self.into_fields()?,
                done,
            }),
            (None, _) => Ok(TaskCommand::Create(self.into_fields()?)),
        }
    }

    fn into_fields(self) -> Result<TaskFields, AppError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("Task title is required".into()))?;
        Ok(TaskFields {
            title,
            description: self.desc,
            priority: self.prio,
            due_date: self.due,
            tags: self.tags.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskIdRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkIdsRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

impl BulkIdsRequest {
    pub fn non_empty(self) -> Result<Vec<i64>, AppError> {
        if self.ids.is_empty() {
            return Err(AppError::Validation("No task IDs provided".into()));
        }
        Ok(self.ids)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl ListTasksQuery {
    /// Positive integer or a validation error.
    pub fn owner(&self) -> Result<i64, AppError> {
        self.user_id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Validation("Missing or invalid userId".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub deleted_tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCompleteResponse {
    pub success: bool,
    pub updated_count: usize,
    pub updated_tasks: Vec<Task>,
}
