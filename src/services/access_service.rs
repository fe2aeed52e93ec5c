// src/services/access_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::UserRepository;
use crate::models::auth::User;
use crate::models::rbac::SUPER_ADMIN_ROLE;

#[derive(Clone)]
pub struct AccessService {
    users: Arc<dyn UserRepository>,
}

impl AccessService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// União das permissões de todos os cargos do usuário.
    /// Sempre consulta o banco: edições de cargo valem já na próxima requisição.
    pub async fn effective_permissions(&self, user_id: Uuid) -> Result<BTreeSet<String>, AppError> {
        Ok(self.users.effective_permissions(user_id).await?.into_iter().collect())
    }

    pub async fn role_names(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let roles = self.users.roles_of(user_id).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    pub async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.role_names(user_id).await?.iter().any(|name| name == SUPER_ADMIN_ROLE))
    }

    /// Libera a ação se `required` estiver no conjunto efetivo do usuário.
    /// Quem tem o cargo `super-admin` passa em qualquer checagem.
    pub async fn authorize(&self, user: &User, required: &str) -> Result<(), AppError> {
        if self.is_super_admin(user.id).await? {
            return Ok(());
        }

        if self.effective_permissions(user.id).await?.contains(required) {
            return Ok(());
        }

        tracing::warn!(user_id = %user.id, permission = required, "acesso negado");
        Err(AppError::Forbidden(required.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_repo::MemoryStore;
    use crate::db::{PermissionRepository, RoleRepository};
    use crate::models::auth::NewUser;

    async fn user_with_roles(store: &MemoryStore, email: &str, role_ids: &[Uuid]) -> User {
        let new_user = NewUser {
            name: "Fulano".into(),
            email: email.into(),
            password_hash: "x".into(),
        };
        UserRepository::create(store, &new_user, role_ids).await.unwrap()
    }

    #[tokio::test]
    async fn effective_set_is_the_union_of_all_roles() {
        let store = MemoryStore::new();
        let a = PermissionRepository::create(&store, "users index").await.unwrap();
        let b = PermissionRepository::create(&store, "users edit").await.unwrap();
        let c = PermissionRepository::create(&store, "roles index").await.unwrap();
        let first = RoleRepository::create(&store, "first", &[a.id, b.id]).await.unwrap();
        let second = RoleRepository::create(&store, "second", &[b.id, c.id]).await.unwrap();
        let user = user_with_roles(&store, "u@x.com", &[first.id, second.id]).await;

        let access = AccessService::new(Arc::new(store));
        let set = access.effective_permissions(user.id).await.unwrap();

        let expected: BTreeSet<String> = ["roles index", "users edit", "users index"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set, expected);
    }

    #[tokio::test]
    async fn authorize_rejects_missing_permission() {
        let store = MemoryStore::new();
        let p = PermissionRepository::create(&store, "users index").await.unwrap();
        let role = RoleRepository::create(&store, "viewer", &[p.id]).await.unwrap();
        let user = user_with_roles(&store, "v@x.com", &[role.id]).await;

        let access = AccessService::new(Arc::new(store));
        assert!(access.authorize(&user, "users index").await.is_ok());
        let err = access.authorize(&user, "users delete").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(p) if p == "users delete"));
    }

    #[tokio::test]
    async fn super_admin_passes_every_check_without_holding_the_permission() {
        let store = MemoryStore::new();
        let role = RoleRepository::create(&store, SUPER_ADMIN_ROLE, &[]).await.unwrap();
        let user = user_with_roles(&store, "root@x.com", &[role.id]).await;

        let access = AccessService::new(Arc::new(store));
        assert!(access.effective_permissions(user.id).await.unwrap().is_empty());
        assert!(access.authorize(&user, "permissions delete").await.is_ok());
    }

    #[tokio::test]
    async fn permission_changes_apply_on_the_next_check() {
        let store = MemoryStore::new();
        let p = PermissionRepository::create(&store, "roles edit").await.unwrap();
        let role = RoleRepository::create(&store, "editor", &[p.id]).await.unwrap();
        let user = user_with_roles(&store, "e@x.com", &[role.id]).await;

        let access = AccessService::new(Arc::new(store.clone()));
        assert!(access.authorize(&user, "roles edit").await.is_ok());

        PermissionRepository::delete(&store, p.id).await.unwrap();
        assert!(access.authorize(&user, "roles edit").await.is_err());
    }
}
