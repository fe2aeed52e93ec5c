// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;

use crate::db::Repositories;
use crate::services::{
    access_service::AccessService, auth::AuthService, permission_service::PermissionService,
    profile_service::ProfileService, role_service::RoleService, user_service::UserService,
};

/// Conta administradora criada no boot, se as variáveis existirem.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    // O modelo de usuário exige verificação de e-mail?
    pub must_verify_email: bool,
    pub admin: Option<AdminSeed>,
}

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} tem um valor inválido: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_ttl_hours: var_or("SESSION_TTL_HOURS", 24 * 7)?,
            bcrypt_cost: var_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            must_verify_email: var_or("MUST_VERIFY_EMAIL", true)?,
            admin,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: 1,
            jwt_secret: "segredo-de-teste".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session_ttl_hours: 1,
            // Custo mínimo do bcrypt: os testes não precisam de hash lento
            bcrypt_cost: 4,
            must_verify_email: true,
            admin: None,
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub access_service: AccessService,
    pub permission_service: PermissionService,
    pub role_service: RoleService,
    pub user_service: UserService,
    pub profile_service: ProfileService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(config: Config, repos: Repositories) -> Self {
        let config = Arc::new(config);

        Self {
            auth_service: AuthService::new(repos.users.clone(), repos.sessions.clone(), config.clone()),
            access_service: AccessService::new(repos.users.clone()),
            permission_service: PermissionService::new(repos.permissions.clone()),
            role_service: RoleService::new(repos.roles.clone(), repos.permissions.clone()),
            user_service: UserService::new(repos.users.clone(), repos.roles.clone(), config.bcrypt_cost),
            profile_service: ProfileService::new(repos.users, repos.sessions, config.clone()),
            config,
        }
    }
}
