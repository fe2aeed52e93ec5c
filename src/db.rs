pub mod permission_repo;
pub use permission_repo::{PermissionRepository, PgPermissionRepository};
pub mod role_repo;
pub use role_repo::{PgRoleRepository, RoleRepository};
pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod session_repo;
pub use session_repo::{PgSessionRepository, SessionRepository};

#[cfg(test)]
pub mod memory_repo;

use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::Config;

/// Os quatro repositórios que os serviços recebem, já como trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub permissions: Arc<dyn PermissionRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            permissions: Arc::new(PgPermissionRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
        }
    }
}

// Conecta ao banco de dados, usando '?' para propagar erros
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}
