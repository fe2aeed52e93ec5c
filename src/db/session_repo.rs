// src/db/session_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::auth::Session;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Session>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_flash(&self, id: Uuid, message: &str) -> Result<(), AppError>;

    /// Lê e apaga a mensagem de status (uso único).
    async fn take_flash(&self, id: Uuid) -> Result<Option<String>, AppError>;
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, flash, created_at, expires_at
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(session)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, flash, created_at, expires_at FROM sessions WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_flash(&self, id: Uuid, message: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET flash = $2 WHERE id = $1")
            .bind(id)
            .bind(message)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn take_flash(&self, id: Uuid) -> Result<Option<String>, AppError> {
        // A subquery lê o valor antigo antes do UPDATE zerar a coluna.
        let flash: Option<Option<String>> = sqlx::query_scalar(
            r#"
            UPDATE sessions s SET flash = NULL
            FROM (SELECT id, flash FROM sessions WHERE id = $1 FOR UPDATE) old
            WHERE s.id = old.id
            RETURNING old.flash
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(flash.flatten())
    }
}
