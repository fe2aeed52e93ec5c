// src/db/user_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{ListFilter, Paged};
use crate::models::auth::{NewUser, User, UserWithRoles};
use crate::models::rbac::Role;

const DUPLICATE_EMAIL: &str = "Este e-mail já está em uso.";

const USER_COLUMNS: &str = "id, name, email, password_hash, email_verified_at, created_at, updated_at";

// O repositório de usuários, responsável pelas tabelas 'users' e 'user_roles'
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Listagem paginada com os cargos de cada usuário já carregados.
    async fn search(&self, filter: &ListFilter) -> Result<Paged<UserWithRoles>, AppError>;

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, AppError>;

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Cria a conta e concede (grant) os cargos, na mesma transação.
    async fn create(&self, new_user: &NewUser, role_ids: &[Uuid]) -> Result<User, AppError>;

    /// Atualiza nome/e-mail (senha intacta) e sincroniza os cargos para exatamente `role_ids`.
    /// Trocar o e-mail zera `email_verified_at`.
    async fn update(&self, id: Uuid, name: &str, email: &str, role_ids: &[Uuid]) -> Result<Option<User>, AppError>;

    /// Mesma regra de e-mail do `update`, sem mexer nos cargos.
    async fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Option<User>, AppError>;

    /// `true` se a linha existia. Vínculos e sessões caem junto.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// União das permissões de todos os cargos do usuário, sem repetição, em ordem alfabética.
    async fn effective_permissions(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Grant: adiciona cargos ao usuário sem remover os que ele já tem.
pub async fn assign_roles<'e, E>(executor: E, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
        .bind(user_id)
        .bind(role_ids)
        .execute(executor)
        .await?;

    Ok(())
}

/// Primeira metade do sync de cargos (ver `assign_roles`).
pub async fn remove_roles_except<'e, E>(executor: E, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND NOT (role_id = ANY($2))")
        .bind(user_id)
        .bind(role_ids)
        .execute(executor)
        .await?;

    Ok(())
}

/// UPDATE compartilhado por `update` e `update_profile`.
async fn update_identity<'e, E>(executor: E, id: Uuid, name: &str, email: &str) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    // O CASE compara com o valor antigo da linha: e-mail igual mantém a verificação.
    let sql = format!(
        r#"
        UPDATE users SET
            name = $2,
            email_verified_at = CASE WHEN email = $3 THEN email_verified_at ELSE NULL END,
            email = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "email", DUPLICATE_EMAIL))
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_roles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Role>>, AppError> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT ur.user_id, r.id, r.name, r.created_at, r.updated_at
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY r.name
            "#,
        )
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_user: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for row in rows {
            by_user.entry(row.user_id).or_default().push(Role {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(by_user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<UserWithRoles>, AppError> {
        let pattern = filter.like_pattern();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name ILIKE $1)")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let mut roles = self.load_roles(&ids).await?;

        let items = users
            .into_iter()
            .map(|user| UserWithRoles {
                roles: roles.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect();

        Ok(Paged { items, total })
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, AppError> {
        let mut by_user = self.load_roles(&[user_id]).await?;
        Ok(by_user.remove(&user_id).unwrap_or_default())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
            .bind(email)
            .bind(except)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, new_user: &NewUser, role_ids: &[Uuid]) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "email", DUPLICATE_EMAIL))?;

        // Se falhar aqui, o usuário criado acima é desfeito junto
        assign_roles(&mut *tx, user.id, role_ids).await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn update(&self, id: Uuid, name: &str, email: &str, role_ids: &[Uuid]) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(user) = update_identity(&mut *tx, id, name, email).await? else {
            return Ok(None);
        };

        remove_roles_except(&mut *tx, user.id, role_ids).await?;
        assign_roles(&mut *tx, user.id, role_ids).await?;

        tx.commit().await?;

        Ok(Some(user))
    }

    async fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Option<User>, AppError> {
        update_identity(&self.pool, id, name, email).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn effective_permissions(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name
            FROM user_roles ur
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            ORDER BY p.name
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}
