// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::pagination::{Filters, Page};
use crate::models::rbac::Role;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "Ana Souza")]
    pub name: String,

    #[schema(example = "ana@example.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    // NULL = e-mail ainda não verificado
    pub email_verified_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,

    pub roles: Vec<Role>,
}

/// Sessão por trás de cada token. Apagar a linha invalida o token na hora.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    // Mensagem de status de uso único (ex: "profile-updated")
    pub flash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// Dados para criar um usuário no banco (senha já com hash)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub sid: Uuid,  // Sessão que emitiu o token
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

fn validate_lowercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_uppercase) {
        let mut err = ValidationError::new("lowercase");
        err.message = Some("O e-mail deve estar em letras minúsculas.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads (form-urlencoded)
// ---

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(min = 4, message = "A senha deve ter no mínimo 4 caracteres."),
        must_match(other = "password_confirmation", message = "A confirmação da senha não confere.")
    )]
    pub password: String,

    #[serde(default)]
    pub password_confirmation: String,

    // O front antigo manda `selectedRoles`
    #[serde(default, alias = "selectedRoles")]
    #[validate(length(min = 1, message = "Selecione ao menos um cargo."))]
    #[schema(example = json!(["analyst"]))]
    pub selected_roles: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    // O front antigo manda `selectedRoles`
    #[serde(default, alias = "selectedRoles")]
    #[validate(length(min = 1, message = "Selecione ao menos um cargo."))]
    #[schema(example = json!(["analyst"]))]
    pub selected_roles: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório (máx. 255 caracteres)."))]
    pub name: String,

    #[serde(default)]
    #[validate(
        email(message = "O e-mail fornecido é inválido."),
        length(max = 255, message = "O e-mail deve ter no máximo 255 caracteres."),
        custom(function = "validate_lowercase")
    )]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteAccountPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe a senha atual."))]
    pub password: String,
}

// ---
// Respostas
// ---

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Quem está logado e o que pode fazer (o front esconde botões com isso)
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserIndex {
    pub users: Page<UserWithRoles>,
    pub filters: Filters,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCreateForm {
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEditForm {
    pub user: UserWithRoles,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    pub user: User,
    pub must_verify_email: bool,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_payload(password: &str, confirmation: &str) -> CreateUserPayload {
        CreateUserPayload {
            name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
            selected_roles: vec!["analyst".into()],
        }
    }

    #[test]
    fn password_must_match_confirmation() {
        assert!(create_payload("secret", "secret").validate().is_ok());
        let errors = create_payload("secret", "secreT").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn password_needs_four_characters() {
        let errors = create_payload("abc", "abc").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(create_payload("abcd", "abcd").validate().is_ok());
    }

    #[test]
    fn user_needs_at_least_one_role() {
        let mut payload = create_payload("secret", "secret");
        payload.selected_roles.clear();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("selected_roles"));
    }

    #[test]
    fn profile_email_must_be_lowercase() {
        let payload = UpdateProfilePayload {
            name: "Ana".into(),
            email: "Ana@Example.com".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn session_expiry_is_inclusive() {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            flash: None,
            created_at: now,
            expires_at: now,
        };
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - chrono::Duration::seconds(1)));
    }
}
