// src/db/permission_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{ListFilter, Paged};
use crate::models::rbac::Permission;

const DUPLICATE_NAME: &str = "Já existe uma permissão com esse nome.";

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Permission>, AppError>;

    /// Listagem paginada, mais recentes primeiro.
    async fn search(&self, filter: &ListFilter) -> Result<Paged<Permission>, AppError>;

    /// Todas, em ordem alfabética (base dos grupos do formulário de cargo).
    async fn list_ordered_by_name(&self) -> Result<Vec<Permission>, AppError>;

    /// Resolve nomes ("users index") para registros. Nomes inexistentes são ignorados.
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, AppError>;

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    async fn create(&self, name: &str) -> Result<Permission, AppError>;

    async fn update(&self, id: Uuid, name: &str) -> Result<Option<Permission>, AppError>;

    /// `true` se a linha existia. Os vínculos com cargos caem junto (cascade).
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgPermissionRepository {
    pool: PgPool,
}

impl PgPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, created_at, updated_at FROM permissions WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(permission)
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<Permission>, AppError> {
        let pattern = filter.like_pattern();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM permissions WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM permissions
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
            .bind(&pattern)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    async fn list_ordered_by_name(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, created_at, updated_at FROM permissions ORDER BY name",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, AppError> {
        // O SQLx lida bem com arrays usando ANY
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM permissions
            WHERE name = ANY($1)
            ORDER BY name
            "#,
        )
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM permissions WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
            .bind(name)
            .bind(except)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, name: &str) -> Result<Permission, AppError> {
        let now = Utc::now();
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, created_at, updated_at
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "name", DUPLICATE_NAME))
    }

    async fn update(&self, id: Uuid, name: &str) -> Result<Option<Permission>, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "name", DUPLICATE_NAME))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
