// src/services/permission_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::pagination::{Filters, ListFilter, Page};
use crate::db::PermissionRepository;
use crate::models::rbac::{Permission, PermissionIndex, PermissionPayload};

#[derive(Clone)]
pub struct PermissionService {
    repo: Arc<dyn PermissionRepository>,
}

impl PermissionService {
    pub fn new(repo: Arc<dyn PermissionRepository>) -> Self {
        Self { repo }
    }

    pub async fn index(&self, filter: ListFilter) -> Result<PermissionIndex, AppError> {
        let paged = self.repo.search(&filter).await?;
        Ok(PermissionIndex {
            permissions: Page::new(paged, &filter),
            filters: Filters::from(&filter),
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<Permission, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Permissão"))
    }

    /// Regras de campo + unicidade (ignorando o próprio registro na edição).
    async fn validate(&self, payload: &PermissionPayload, except: Option<Uuid>) -> Result<(), AppError> {
        payload.validate()?;
        if self.repo.name_taken(&payload.name, except).await? {
            return Err(AppError::field("name", "unique", "Já existe uma permissão com esse nome."));
        }
        Ok(())
    }

    pub async fn create(&self, payload: PermissionPayload) -> Result<Permission, AppError> {
        self.validate(&payload, None).await?;
        let permission = self.repo.create(&payload.name).await?;
        tracing::info!(permission_id = %permission.id, name = %permission.name, "permissão criada");
        Ok(permission)
    }

    pub async fn update(&self, id: Uuid, payload: PermissionPayload) -> Result<Permission, AppError> {
        // 404 antes de qualquer validação
        self.find(id).await?;
        self.validate(&payload, Some(id)).await?;

        let permission = self
            .repo
            .update(id, &payload.name)
            .await?
            .ok_or(AppError::NotFound("Permissão"))?;
        tracing::info!(permission_id = %permission.id, name = %permission.name, "permissão atualizada");
        Ok(permission)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Permissão"));
        }
        tracing::info!(permission_id = %id, "permissão removida");
        Ok(())
    }
}
