// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::pagination::{Filters, ListFilter, Page};
use crate::db::{RoleRepository, UserRepository};
use crate::models::auth::{
    CreateUserPayload, NewUser, UpdateUserPayload, User, UserCreateForm, UserEditForm, UserIndex, UserWithRoles,
};
use crate::models::rbac::SUPER_ADMIN_ROLE;
use crate::services::role_service::dedup_names;

/// Hash bcrypt numa thread de bloqueio, para não travar o runtime.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Verificação bcrypt, também fora do runtime.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, roles: Arc<dyn RoleRepository>, bcrypt_cost: u32) -> Self {
        Self { users, roles, bcrypt_cost }
    }

    pub async fn index(&self, filter: ListFilter) -> Result<UserIndex, AppError> {
        let paged = self.users.search(&filter).await?;
        Ok(UserIndex {
            users: Page::new(paged, &filter),
            filters: Filters::from(&filter),
        })
    }

    /// Todos os cargos, mais recentes primeiro, sem filtro.
    pub async fn create_form(&self) -> Result<UserCreateForm, AppError> {
        Ok(UserCreateForm {
            roles: self.roles.list_latest(None).await?,
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.users.find_by_id(id).await?.ok_or(AppError::NotFound("Usuário"))
    }

    /// O `super-admin` nunca aparece como opção aqui.
    pub async fn edit_form(&self, id: Uuid) -> Result<UserEditForm, AppError> {
        let user = self.find(id).await?;
        let current_roles = self.users.roles_of(user.id).await?;
        let roles = self.roles.list_latest(Some(SUPER_ADMIN_ROLE)).await?;

        Ok(UserEditForm {
            user: UserWithRoles { user, roles: current_roles },
            roles,
        })
    }

    async fn resolve_roles(&self, selected: &[String]) -> Result<Vec<Uuid>, AppError> {
        let selected = dedup_names(selected);
        let found = self.roles.find_by_names(&selected).await?;
        if let Some(missing) = selected.iter().find(|name| !found.iter().any(|r| &r.name == *name)) {
            return Err(AppError::field(
                "selected_roles",
                "exists",
                format!("O cargo '{}' não existe.", missing),
            ));
        }
        Ok(found.into_iter().map(|r| r.id).collect())
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
        if self.users.email_taken(email, except).await? {
            return Err(AppError::field("email", "unique", "Este e-mail já está em uso."));
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;
        self.ensure_email_free(&payload.email, None).await?;
        let role_ids = self.resolve_roles(&payload.selected_roles).await?;

        let new_user = NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: hash_password(&payload.password, self.bcrypt_cost).await?,
        };
        let user = self.users.create(&new_user, &role_ids).await?;

        tracing::info!(user_id = %user.id, roles = role_ids.len(), "usuário criado");
        Ok(user)
    }

    /// O `super-admin` não é atribuível pela edição. Quem já o tem continua com ele:
    /// a sincronização só alcança os demais cargos.
    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        self.find(id).await?;
        payload.validate()?;
        if payload.selected_roles.iter().any(|name| name == SUPER_ADMIN_ROLE) {
            tracing::warn!(user_id = %id, "tentativa de atribuir o cargo reservado");
            return Err(AppError::field(
                "selected_roles",
                "reserved",
                "O cargo 'super-admin' não pode ser atribuído por aqui.",
            ));
        }
        self.ensure_email_free(&payload.email, Some(id)).await?;
        let mut role_ids = self.resolve_roles(&payload.selected_roles).await?;

        let current_roles = self.users.roles_of(id).await?;
        if let Some(reserved) = current_roles.iter().find(|r| r.name == SUPER_ADMIN_ROLE) {
            role_ids.push(reserved.id);
        }

        let user = self
            .users
            .update(id, &payload.name, &payload.email, &role_ids)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        tracing::info!(user_id = %user.id, roles = role_ids.len(), "usuário atualizado");
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("Usuário"));
        }
        tracing::info!(user_id = %id, "usuário removido");
        Ok(())
    }
}
