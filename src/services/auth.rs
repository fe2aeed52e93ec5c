// src/services/auth.rs

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::Config,
    db::{SessionRepository, UserRepository},
    models::auth::{Claims, LoginUserPayload, Session, User},
    services::user_service::verify_password,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>, config: Arc<Config>) -> Self {
        Self { users, sessions, config }
    }

    pub async fn login_user(&self, payload: &LoginUserPayload) -> Result<String, AppError> {
        payload.validate()?;

        let user = self
            .users
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&payload.password, &user.password_hash).await? {
            tracing::warn!(email = %payload.email, "tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let expires_at = Utc::now() + chrono::Duration::hours(self.config.session_ttl_hours);
        let session = self.sessions.create(user.id, expires_at).await?;
        tracing::info!(user_id = %user.id, session_id = %session.id, "sessão iniciada");

        self.create_token(&session)
    }

    pub async fn logout(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions.delete(session_id).await?;
        tracing::info!(session_id = %session_id, "sessão encerrada");
        Ok(())
    }

    /// Token válido = assinatura ok + sessão ainda existente e não expirada + usuário existente.
    pub async fn validate_token(&self, token: &str) -> Result<(User, Session), AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        let claims = token_data.claims;

        let session = self
            .sessions
            .find(claims.sid)
            .await?
            .filter(|s| s.user_id == claims.sub && !s.is_expired(Utc::now()))
            .ok_or(AppError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok((user, session))
    }

    fn create_token(&self, session: &Session) -> Result<String, AppError> {
        let claims = Claims {
            sub: session.user_id,
            sid: session.id,
            exp: session.expires_at.timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_repo::MemoryStore;
    use crate::models::auth::NewUser;
    use crate::services::user_service::hash_password;

    async fn setup() -> (MemoryStore, AuthService, User) {
        let store = MemoryStore::new();
        let new_user = NewUser {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: hash_password("secret", 4).await.unwrap(),
        };
        let user = UserRepository::create(&store, &new_user, &[]).await.unwrap();
        let service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Config::for_tests()),
        );
        (store, service, user)
    }

    fn login(email: &str, password: &str) -> LoginUserPayload {
        LoginUserPayload {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_issues_a_token_bound_to_a_session() {
        let (_, service, user) = setup().await;
        let token = service.login_user(&login("ana@x.com", "secret")).await.unwrap();

        let (resolved, session) = service.validate_token(&token).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_email_is_invalid_credentials() {
        let (_, service, _) = setup().await;
        let err = service.login_user(&login("ana@x.com", "nope")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        let err = service.login_user(&login("who@x.com", "secret")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let (_, service, _) = setup().await;
        let token = service.login_user(&login("ana@x.com", "secret")).await.unwrap();
        let (_, session) = service.validate_token(&token).await.unwrap();

        service.logout(session.id).await.unwrap();
        assert!(matches!(service.validate_token(&token).await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn deleted_user_token_is_rejected() {
        let (store, service, user) = setup().await;
        let token = service.login_user(&login("ana@x.com", "secret")).await.unwrap();
        UserRepository::delete(&store, user.id).await.unwrap();
        assert!(matches!(service.validate_token(&token).await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (_, service, _) = setup().await;
        assert!(matches!(service.validate_token("abc.def.ghi").await, Err(AppError::InvalidToken)));
    }
}
