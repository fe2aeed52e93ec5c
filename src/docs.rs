// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Permissions ---
        handlers::permissions::index,
        handlers::permissions::create,
        handlers::permissions::store,
        handlers::permissions::edit,
        handlers::permissions::update,
        handlers::permissions::destroy,

        // --- Roles ---
        handlers::roles::index,
        handlers::roles::create,
        handlers::roles::store,
        handlers::roles::edit,
        handlers::roles::update,
        handlers::roles::destroy,

        // --- Users ---
        handlers::users::index,
        handlers::users::create,
        handlers::users::store,
        handlers::users::edit,
        handlers::users::update,
        handlers::users::destroy,

        // --- Profile ---
        handlers::profile::edit,
        handlers::profile::update,
        handlers::profile::destroy,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::UserWithRoles,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- Users ---
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::UserIndex,
            models::auth::UserCreateForm,
            models::auth::UserEditForm,

            // --- Profile ---
            models::auth::UpdateProfilePayload,
            models::auth::DeleteAccountPayload,
            models::auth::ProfileEdit,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::Role,
            models::rbac::RoleWithPermissions,
            models::rbac::PermissionOption,
            models::rbac::PermissionPayload,
            models::rbac::RolePayload,
            models::rbac::PermissionIndex,
            models::rbac::PermissionEdit,
            models::rbac::RoleIndex,
            models::rbac::RoleCreateForm,
            models::rbac::RoleEditForm,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e sessão atual"),
        (name = "Permissions", description = "Cadastro de permissões"),
        (name = "Roles", description = "Cargos e suas permissões"),
        (name = "Users", description = "Contas de usuário e seus cargos"),
        (name = "Profile", description = "Autoatendimento da própria conta")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
