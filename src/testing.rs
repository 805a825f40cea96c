//! In-memory repositories with the same owner-scoping rules as the Postgres ones.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    repo::UserRepo,
    repo_types::{NewUser, PublicProfile, User},
};
use crate::error::AppError;
use crate::tasks::{
    repo::TaskRepo,
    repo_types::{Task, TaskFields},
};

#[derive(Default)]
pub struct MemoryUserRepo {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_public_profile(&self, id: i64) -> anyhow::Result<Option<PublicProfile>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).map(|u| PublicProfile {
            id: u.id,
            name: u.name.clone(),
            surname: u.surname.clone(),
        }))
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == new.email) {
            return Err(AppError::DuplicateEmail);
        }
        let user = User {
            id: rows.len() as i64 + 1,
            name: new.name,
            surname: new.surname,
            email: new.email,
            password: new.password_digest,
        };
        rows.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryTaskRepo {
    inner: Mutex<(i64, Vec<Task>)>,
}

impl MemoryTaskRepo {
    fn with_owned<R>(
        &self,
        task_id: i64,
        owner_id: i64,
        f: impl FnOnce(&mut Task) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .1
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == owner_id)
            .map(f)
    }
}

#[async_trait]
impl TaskRepo for MemoryTaskRepo {
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Task>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Task> = inner
            .1
            .iter()
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn create(&self, owner_id: i64, fields: TaskFields) -> anyhow::Result<Task> {
        let mut inner = self.inner.lock().unwrap();
        inner.0 += 1;
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: inner.0,
            user_id: owner_id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            priority: fields.priority,
            tags: fields.tags,
            done: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.1.push(task.clone());
        Ok(task)
    }

    async fn update_full(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
        done: Option<bool>,
    ) -> anyhow::Result<Option<Task>> {
        Ok(self.with_owned(task_id, owner_id, |t| {
            t.title = fields.title;
            t.description = fields.description;
            t.priority = fields.priority;
            t.due_date = fields.due_date;
            t.tags = fields.tags;
            if let Some(done) = done {
                t.done = done;
            }
            t.updated_at = OffsetDateTime::now_utc();
            t.clone()
        }))
    }

    async fn update_done_flag(
        &self,
        task_id: i64,
        owner_id: i64,
        done: bool,
    ) -> anyhow::Result<Option<Task>> {
        Ok(self.with_owned(task_id, owner_id, |t| {
            t.done = done;
            t.updated_at = OffsetDateTime::now_utc();
            t.clone()
        }))
    }

    async fn toggle_done(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>> {
        Ok(self.with_owned(task_id, owner_id, |t| {
            t.done = !t.done;
            t.updated_at = OffsetDateTime::now_utc();
            t.clone()
        }))
    }

    async fn delete(&self, task_id: i64, owner_id: i64) -> anyhow::Result<Option<Task>> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .1
            .iter()
            .position(|t| t.id == task_id && t.user_id == owner_id);
        Ok(pos.map(|i| inner.1.remove(i)))
    }

    async fn bulk_delete(&self, ids: &[i64], owner_id: i64) -> anyhow::Result<Vec<Task>> {
        let mut inner = self.inner.lock().unwrap();
        let (deleted, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut inner.1)
            .into_iter()
            .partition(|t| t.user_id == owner_id && ids.contains(&t.id));
        inner.1 = kept;
        Ok(deleted)
    }

    async fn bulk_complete(
        &self,
        ids: &[i64],
        owner_id: i64,
        completed_at_ms: i64,
    ) -> anyhow::Result<Vec<Task>> {
        let completed_at =
            OffsetDateTime::from_unix_timestamp_nanos(completed_at_ms as i128 * 1_000_000)?;
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .1
            .iter_mut()
            .filter(|t| t.user_id == owner_id && ids.contains(&t.id))
            .map(|t| {
                t.done = true;
                t.completed_at = Some(completed_at);
                t.updated_at = now;
                t.clone()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{dto::TaskCommand, services};

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.into(),
            ..TaskFields::default()
        }
    }

    #[tokio::test]
    async fn odd_toggles_flip_even_toggles_restore() {
        let repo = MemoryTaskRepo::default();
        let task = repo.create(1, fields("t")).await.unwrap();
        for n in 1..=5 {
            let t = services::toggle(&repo, 1, task.id).await.unwrap();
            assert_eq!(t.done, n % 2 == 1);
        }
    }

    #[tokio::test]
    async fn services_report_not_found_for_foreign_owner() {
        let repo = MemoryTaskRepo::default();
        let task = repo.create(1, fields("t")).await.unwrap();

        let err = services::apply(&repo, 2, TaskCommand::SetDone { id: task.id, done: true })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(services::delete(&repo, 2, task.id).await.is_err());
        assert!(!repo.list_by_owner(1).await.unwrap()[0].done);
    }

    #[tokio::test]
    async fn bulk_complete_uses_given_instant() {
        let repo = MemoryTaskRepo::default();
        let a = repo.create(1, fields("a")).await.unwrap();
        let now = time::macros::datetime!(2024-02-29 12:30:15.250 UTC);

        let updated = services::bulk_complete(&repo, 1, &[a.id, 77], now).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].completed_at, Some(now));

        let none = services::bulk_complete(&repo, 2, &[a.id], now).await;
        assert!(matches!(none, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn memory_users_reject_duplicate_email() {
        let repo = MemoryUserRepo::default();
        let new = || NewUser {
            name: "a".into(),
            surname: "b".into(),
            email: "dup@example.com".into(),
            password_digest: "x".into(),
        };
        repo.create(new()).await.unwrap();
        assert!(matches!(repo.create(new()).await, Err(AppError::DuplicateEmail)));
    }
}
