// src/services/role_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::pagination::{Filters, ListFilter, Page};
use crate::db::{PermissionRepository, RoleRepository};
use crate::models::rbac::{
    Permission, PermissionGroups, PermissionOption, Role, RoleCreateForm, RoleEditForm, RoleIndex, RolePayload,
    RoleWithPermissions, SUPER_ADMIN_ROLE,
};

/// Agrupa as permissões (já em ordem alfabética) pela primeira palavra do nome.
/// A ordem dentro de cada grupo é a ordem de entrada.
pub fn group_permissions(permissions: &[Permission]) -> PermissionGroups {
    let mut groups = PermissionGroups::new();
    for permission in permissions {
        let key = permission.name.split_whitespace().next().unwrap_or_default();
        groups.entry(key.to_string()).or_default().push(PermissionOption {
            id: permission.id,
            name: permission.name.clone(),
        });
    }
    groups
}

/// Remove repetições mantendo a ordem em que os nomes chegaram.
pub(crate) fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names.iter().filter(|n| seen.insert(n.as_str())).cloned().collect()
}

#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleRepository>, permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { roles, permissions }
    }

    pub async fn index(&self, filter: ListFilter) -> Result<RoleIndex, AppError> {
        let paged = self.roles.search(&filter).await?;
        Ok(RoleIndex {
            roles: Page::new(paged, &filter),
            filters: Filters::from(&filter),
        })
    }

    async fn permission_groups(&self) -> Result<PermissionGroups, AppError> {
        let permissions = self.permissions.list_ordered_by_name().await?;
        Ok(group_permissions(&permissions))
    }

    pub async fn create_form(&self) -> Result<RoleCreateForm, AppError> {
        Ok(RoleCreateForm {
            permissions: self.permission_groups().await?,
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<Role, AppError> {
        self.roles.find_by_id(id).await?.ok_or(AppError::NotFound("Cargo"))
    }

    pub async fn edit_form(&self, id: Uuid) -> Result<RoleEditForm, AppError> {
        let role = self.find(id).await?;
        let permissions = self.roles.permissions_of(role.id).await?;
        Ok(RoleEditForm {
            role: RoleWithPermissions { role, permissions },
            permissions: self.permission_groups().await?,
        })
    }

    /// Valida o payload e resolve os nomes selecionados para IDs.
    /// Nenhuma escrita acontece antes disso terminar.
    async fn validate(&self, payload: &RolePayload, current: Option<&Role>) -> Result<Vec<Uuid>, AppError> {
        payload.validate()?;

        // Ninguém vira super-admin e o super-admin não troca de nome
        let was_reserved = current.is_some_and(|role| role.name == SUPER_ADMIN_ROLE);
        if was_reserved != (payload.name == SUPER_ADMIN_ROLE) {
            return Err(AppError::field("name", "reserved", "O nome 'super-admin' é reservado."));
        }

        if self.roles.name_taken(&payload.name, current.map(|role| role.id)).await? {
            return Err(AppError::field("name", "unique", "Já existe um cargo com esse nome."));
        }

        let selected = dedup_names(&payload.selected_permissions);
        let found = self.permissions.find_by_names(&selected).await?;
        if let Some(missing) = selected.iter().find(|name| !found.iter().any(|p| &p.name == *name)) {
            return Err(AppError::field(
                "selected_permissions",
                "exists",
                format!("A permissão '{}' não existe.", missing),
            ));
        }

        Ok(found.into_iter().map(|p| p.id).collect())
    }

    pub async fn create(&self, payload: RolePayload) -> Result<Role, AppError> {
        let permission_ids = self.validate(&payload, None).await?;
        let role = self.roles.create(&payload.name, &permission_ids).await?;
        tracing::info!(role_id = %role.id, name = %role.name, permissions = permission_ids.len(), "cargo criado");
        Ok(role)
    }

    pub async fn update(&self, id: Uuid, payload: RolePayload) -> Result<Role, AppError> {
        let current = self.find(id).await?;
        let permission_ids = self.validate(&payload, Some(&current)).await?;
        let role = self
            .roles
            .update(id, &payload.name, &permission_ids)
            .await?
            .ok_or(AppError::NotFound("Cargo"))?;
        tracing::info!(role_id = %role.id, name = %role.name, permissions = permission_ids.len(), "cargo atualizado");
        Ok(role)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.find(id).await?.name == SUPER_ADMIN_ROLE {
            tracing::warn!(role_id = %id, "tentativa de remover o cargo reservado");
            return Err(AppError::ReservedRole);
        }
        if !self.roles.delete(id).await? {
            return Err(AppError::NotFound("Cargo"));
        }
        tracing::info!(role_id = %id, "cargo removido");
        Ok(())
    }
}
