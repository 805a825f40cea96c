use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::tasks::repo_types::{Task, TaskFields};

/// Every call that names a task also names its owner; a task that exists but
/// belongs to someone else is reported exactly like a missing one (`None`).
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Newest id first.
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Task>>;

    async fn create(&self, owner_id: i64, fields: TaskFields) -> anyhow::Result<Task>;

    /// Overwrites every editable field; `done` only when given.
    async fn update_full(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
        done: Option<bool>,
    ) -> anyhow::Result<Option<Task>>;

    async fn update_done_flag(
        &self,
        task_id: i64,
        owner_id: i64,
        done: bool,
    ) -> anyhow::Result<Option<Task>>;

    /// Flips the stored value in one statement.
    async fn toggle_done(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>>;

    async fn delete(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>>;

    /// Deletes the owned subset of `ids`; unknown or foreign ids are skipped.
    async fn bulk_delete(&self, ids: &[i64], owner_id: i64) -> anyhow::Result<Vec<Task>>;

    /// Marks the owned subset of `ids` done, stamping `completed_at`.
    async fn bulk_complete(
        &self,
        ids: &[i64],
        owner_id: i64,
        completed_at_ms: i64,
    ) -> anyhow::Result<Vec<Task>>;
}

pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, due_date, priority, tags, done,
                   completed_at, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list tasks by owner")?;
        Ok(rows)
    }

    async fn create(&self, owner_id: i64, fields: TaskFields) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, due_date, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.priority)
        .bind(fields.due_date)
        .bind(&fields.tags)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(task)
    }

    async fn update_full(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
        done: Option<bool>,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET title = $1, description = $2, priority = $3, due_date = $4, tags = $5,
                   done = COALESCE($6, done), updated_at = now()
             WHERE id = $7 AND user_id = $8
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.priority)
        .bind(fields.due_date)
        .bind(&fields.tags)
        .bind(done)
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("update task")?;
        Ok(task)
    }

    async fn update_done_flag(
        &self,
        task_id: i64,
        owner_id: i64,
        done: bool,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET done = $1, updated_at = now()
             WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(done)
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("update task done flag")?;
        Ok(task)
    }

    async fn toggle_done(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET done = NOT done, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("toggle task")?;
        Ok(task)
    }

    async fn delete(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("delete task")?;
        Ok(task)
    }

    async fn bulk_delete(&self, ids: &[i64], owner_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            "DELETE FROM tasks WHERE id = ANY($1) AND user_id = $2 RETURNING *",
        )
        .bind(ids)
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("bulk delete tasks")?;
        Ok(rows)
    }

    async fn bulk_complete(
        &self,
        ids: &[i64],
        owner_id: i64,
        completed_at_ms: i64,
    ) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET done = TRUE,
                   completed_at = to_timestamp($2::float8 / 1000.0),
                   updated_at = now()
             WHERE id = ANY($1) AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(ids)
        .bind(completed_at_ms)
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("bulk complete tasks")?;
        Ok(rows)
    }
}
