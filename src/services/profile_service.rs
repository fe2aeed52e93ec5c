// src/services/profile_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::error::AppError,
    config::Config,
    db::{SessionRepository, UserRepository},
    middleware::auth::AuthenticatedUser,
    models::auth::{DeleteAccountPayload, ProfileEdit, UpdateProfilePayload, User},
    services::user_service::verify_password,
};

pub const STATUS_PROFILE_UPDATED: &str = "profile-updated";

/// Autoatendimento: só mexe na conta de quem está logado.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    config: Arc<Config>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>, config: Arc<Config>) -> Self {
        Self { users, sessions, config }
    }

    pub async fn edit(&self, acting: &AuthenticatedUser) -> Result<ProfileEdit, AppError> {
        let status = self.sessions.take_flash(acting.session_id).await?;
        Ok(ProfileEdit {
            user: acting.user.clone(),
            must_verify_email: self.config.must_verify_email,
            status,
        })
    }

    pub async fn update(&self, acting: &AuthenticatedUser, payload: UpdateProfilePayload) -> Result<User, AppError> {
        payload.validate()?;

        let id = acting.user.id;
        if self.users.email_taken(&payload.email, Some(id)).await? {
            return Err(AppError::field("email", "unique", "Este e-mail já está em uso."));
        }

        let user = self
            .users
            .update_profile(id, &payload.name, &payload.email)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        if user.email_verified_at.is_none() && acting.user.email_verified_at.is_some() {
            tracing::info!(user_id = %id, "e-mail alterado, verificação zerada");
        }

        self.sessions.set_flash(acting.session_id, STATUS_PROFILE_UPDATED).await?;
        Ok(user)
    }

    /// Exclusão da própria conta. Senha errada = erro de validação e nada muda.
    pub async fn destroy(&self, acting: &AuthenticatedUser, payload: DeleteAccountPayload) -> Result<(), AppError> {
        payload.validate()?;

        if !verify_password(&payload.password, &acting.user.password_hash).await? {
            return Err(AppError::field("password", "current_password", "A senha informada está incorreta."));
        }

        let id = acting.user.id;
        // As sessões (inclusive a atual) caem junto pelo ON DELETE CASCADE
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("Usuário"));
        }

        tracing::info!(user_id = %id, "conta excluída pelo próprio usuário");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::db::memory_repo::MemoryStore;
    use crate::db::RoleRepository;
    use crate::models::auth::NewUser;
    use crate::services::user_service::hash_password;

    struct Fixture {
        store: MemoryStore,
        service: ProfileService,
        acting: AuthenticatedUser,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let role = RoleRepository::create(&store, "member", &[]).await.unwrap();
        let new_user = NewUser {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: hash_password("secret", 4).await.unwrap(),
        };
        let user = UserRepository::create(&store, &new_user, &[role.id]).await.unwrap();
        store.verify_email(user.id, Utc::now()).await;
        let user = UserRepository::find_by_id(&store, user.id).await.unwrap().unwrap();

        let session = SessionRepository::create(&store, user.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();
        let service = ProfileService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Config::for_tests()),
        );

        Fixture {
            store,
            service,
            acting: AuthenticatedUser {
                user,
                session_id: session.id,
            },
        }
    }

    fn profile(name: &str, email: &str) -> UpdateProfilePayload {
        UpdateProfilePayload {
            name: name.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn update_with_same_email_keeps_verification_and_flashes_status() {
        let fx = fixture().await;
        let user = fx.service.update(&fx.acting, profile("Ana Maria", "ana@x.com")).await.unwrap();
        assert_eq!(user.name, "Ana Maria");
        assert!(user.email_verified_at.is_some());

        let edit = fx.service.edit(&fx.acting).await.unwrap();
        assert_eq!(edit.status.as_deref(), Some(STATUS_PROFILE_UPDATED));
        assert!(edit.must_verify_email);

        // Uso único
        let again = fx.service.edit(&fx.acting).await.unwrap();
        assert_eq!(again.status, None);
    }

    #[tokio::test]
    async fn update_with_new_email_clears_verification() {
        let fx = fixture().await;
        let user = fx.service.update(&fx.acting, profile("Ana", "ana.nova@x.com")).await.unwrap();
        assert!(user.email_verified_at.is_none());
    }

    #[tokio::test]
    async fn destroy_with_wrong_password_changes_nothing() {
        let fx = fixture().await;
        let err = fx
            .service
            .destroy(&fx.acting, DeleteAccountPayload { password: "wrong".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let id = fx.acting.user.id;
        assert!(UserRepository::find_by_id(&fx.store, id).await.unwrap().is_some());
        assert_eq!(UserRepository::roles_of(&fx.store, id).await.unwrap().len(), 1);
        assert!(SessionRepository::find(&fx.store, fx.acting.session_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn destroy_of_an_already_removed_account_is_not_found() {
        let fx = fixture().await;
        UserRepository::delete(&fx.store, fx.acting.user.id).await.unwrap();

        let err = fx
            .service
            .destroy(&fx.acting, DeleteAccountPayload { password: "secret".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn destroy_with_right_password_removes_account_and_sessions() {
        let fx = fixture().await;
        let id = fx.acting.user.id;
        let other = SessionRepository::create(&fx.store, id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        fx.service
            .destroy(&fx.acting, DeleteAccountPayload { password: "secret".into() })
            .await
            .unwrap();

        assert!(UserRepository::find_by_id(&fx.store, id).await.unwrap().is_none());
        assert!(SessionRepository::find(&fx.store, fx.acting.session_id).await.unwrap().is_none());
        assert!(SessionRepository::find(&fx.store, other.id).await.unwrap().is_none());
    }
}
