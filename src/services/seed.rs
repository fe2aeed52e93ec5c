// src/services/seed.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::Repositories,
    models::{auth::NewUser, rbac::SUPER_ADMIN_ROLE},
    services::user_service::hash_password,
};

pub const RESOURCES: [&str; 3] = ["permissions", "roles", "users"];
pub const ACTIONS: [&str; 4] = ["index", "create", "edit", "delete"];

/// "permissions index", "permissions create", ... "users delete".
pub fn default_permission_names() -> Vec<String> {
    RESOURCES
        .iter()
        .flat_map(|resource| ACTIONS.iter().map(move |action| format!("{} {}", resource, action)))
        .collect()
}

/// Idempotente: pode rodar a cada boot.
pub async fn run(repos: &Repositories, config: &Config) -> Result<(), AppError> {
    let names = default_permission_names();

    let mut existing = repos.permissions.find_by_names(&names).await?;
    for name in &names {
        if !existing.iter().any(|p| &p.name == name) {
            let created = repos.permissions.create(name).await?;
            tracing::info!(name = %created.name, "permissão padrão criada");
            existing.push(created);
        }
    }
    let default_ids: Vec<Uuid> = existing.iter().map(|p| p.id).collect();

    let super_admin = match repos.roles.find_by_name(SUPER_ADMIN_ROLE).await? {
        Some(role) => {
            // Mantém o que já estava concedido e completa com as permissões padrão
            let mut ids: Vec<Uuid> = repos.roles.permissions_of(role.id).await?.into_iter().map(|p| p.id).collect();
            for id in &default_ids {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
            repos
                .roles
                .update(role.id, &role.name, &ids)
                .await?
                .ok_or(AppError::NotFound("Cargo"))?
        }
        None => {
            let role = repos.roles.create(SUPER_ADMIN_ROLE, &default_ids).await?;
            tracing::info!(role_id = %role.id, "cargo super-admin criado");
            role
        }
    };

    if let Some(admin) = &config.admin {
        if repos.users.find_by_email(&admin.email).await?.is_none() {
            let new_user = NewUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password_hash: hash_password(&admin.password, config.bcrypt_cost).await?,
            };
            let user = repos.users.create(&new_user, &[super_admin.id]).await?;
            tracing::info!(user_id = %user.id, email = %user.email, "administrador inicial criado");
        }
    }

    Ok(())
}
