// src/db/role_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{ListFilter, Paged};
use crate::models::rbac::{Permission, Role, RoleWithPermissions};

const DUPLICATE_NAME: &str = "Já existe um cargo com esse nome.";

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    /// Resolve nomes de cargos para registros. Nomes inexistentes são ignorados.
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, AppError>;

    /// Listagem paginada com as permissões de cada cargo já carregadas.
    async fn search(&self, filter: &ListFilter) -> Result<Paged<RoleWithPermissions>, AppError>;

    /// Todos os cargos, mais recentes primeiro, opcionalmente sem o nome informado.
    async fn list_latest(&self, excluding: Option<&str>) -> Result<Vec<Role>, AppError>;

    async fn permissions_of(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError>;

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Cria o cargo e concede (grant) as permissões, na mesma transação.
    async fn create(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, AppError>;

    /// Renomeia e sincroniza (sync) as permissões para exatamente `permission_ids`.
    async fn update(&self, id: Uuid, name: &str, permission_ids: &[Uuid]) -> Result<Option<Role>, AppError>;

    /// `true` se a linha existia. Usuários continuam existindo, só perdem o vínculo.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

// Linha do JOIN cargo <-> permissão, usada para montar o preload
#[derive(Debug, FromRow)]
struct RolePermissionRow {
    role_id: Uuid,
    id: Uuid,
    name: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<RolePermissionRow> for (Uuid, Permission) {
    fn from(row: RolePermissionRow) -> Self {
        (
            row.role_id,
            Permission {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        )
    }
}

/// Grant: adiciona os vínculos sem remover os que já existem.
pub async fn grant_permissions<'e, E>(executor: E, role_id: Uuid, permission_ids: &[Uuid]) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    // Inserção em massa usando UNNEST
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;

    Ok(())
}

/// Primeira metade do sync: remove os vínculos que não estão em `permission_ids`.
/// Seguido de `grant_permissions`, o conjunto fica exatamente igual ao informado.
pub async fn revoke_permissions_except<'e, E>(executor: E, role_id: Uuid, permission_ids: &[Uuid]) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND NOT (permission_id = ANY($2))")
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_permissions(&self, role_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Permission>>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT rp.role_id, p.id, p.name, p.created_at, p.updated_at
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.name
            "#,
        )
            .bind(role_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_role: HashMap<Uuid, Vec<Permission>> = HashMap::new();
        for row in rows {
            let (role_id, permission) = row.into();
            by_role.entry(role_id).or_default().push(permission);
        }
        Ok(by_role)
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, created_at, updated_at FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, created_at, updated_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_at, updated_at FROM roles WHERE name = ANY($1) ORDER BY name",
        )
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<RoleWithPermissions>, AppError> {
        let pattern = filter.like_pattern();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE ($1::text IS NULL OR name ILIKE $1)")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM roles
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

        let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        let mut permissions = self.load_permissions(&ids).await?;

        let items = roles
            .into_iter()
            .map(|role| RoleWithPermissions {
                permissions: permissions.remove(&role.id).unwrap_or_default(),
                role,
            })
            .collect();

        Ok(Paged { items, total })
    }

    async fn list_latest(&self, excluding: Option<&str>) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM roles
            WHERE ($1::text IS NULL OR name <> $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
            .bind(excluding)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn permissions_of(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let mut by_role = self.load_permissions(&[role_id]).await?;
        Ok(by_role.remove(&role_id).unwrap_or_default())
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
            .bind(name)
            .bind(except)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, created_at, updated_at
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "name", DUPLICATE_NAME))?;

        // 3. Salva o Vínculo
        grant_permissions(&mut *tx, role.id, permission_ids).await?;

        // 4. Commit
        tx.commit().await?;

        Ok(role)
    }

    async fn update(&self, id: Uuid, name: &str, permission_ids: &[Uuid]) -> Result<Option<Role>, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
            .bind(id)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "name", DUPLICATE_NAME))?;

        // Cargo sumiu no meio do caminho: o drop do tx faz o rollback
        let Some(role) = role else {
            return Ok(None);
        };

        revoke_permissions_except(&mut *tx, role.id, permission_ids).await?;
        grant_permissions(&mut *tx, role.id, permission_ids).await?;

        tx.commit().await?;

        Ok(Some(role))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
