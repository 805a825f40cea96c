use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, PublicProfile, User};
use crate::error::AppError;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_public_profile(&self, id: i64) -> anyhow::Result<Option<PublicProfile>>;

    /// Fails with [`AppError::DuplicateEmail`] when the email is taken, whether
    /// caught by the pre-check or by the unique constraint.
    async fn create(&self, new: NewUser) -> Result<User, AppError>;
}

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, surname, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_public_profile(&self, id: i64) -> anyhow::Result<Option<PublicProfile>> {
        let profile = sqlx::query_as::<_, PublicProfile>(
            r#"SELECT id, name, surname FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user profile")?;
        Ok(profile)
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, surname, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, surname, email, password
            "#,
        )
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.email)
        .bind(&new.password_digest)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(user) => Ok(user),
            // lost the race against a concurrent signup
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateEmail)
            }
            Err(e) => Err(AppError::Store(anyhow::Error::new(e).context("insert user"))),
        }
    }
}
