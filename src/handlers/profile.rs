// src/handlers/profile.rs

use axum::{extract::State, Json};
use axum_extra::extract::Form;

use crate::{
    common::{error::AppError, redirect::Found},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{DeleteAccountPayload, ProfileEdit, UpdateProfilePayload},
};

// Sem RequirePermission: qualquer usuário logado cuida da própria conta
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Profile",
    responses((status = 200, description = "Dados do perfil e o status pendente", body = ProfileEdit)),
    security(("api_jwt" = []))
)]
pub async fn edit(
    State(app_state): State<AppState>,
    acting: AuthenticatedUser,
) -> Result<Json<ProfileEdit>, AppError> {
    Ok(Json(app_state.profile_service.edit(&acting).await?))
}

#[utoipa::path(
    patch,
    path = "/profile",
    tag = "Profile",
    request_body(content = UpdateProfilePayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Atualizado, redireciona para /profile"),
        (status = 400, description = "Nome ou e-mail inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    State(app_state): State<AppState>,
    acting: AuthenticatedUser,
    Form(payload): Form<UpdateProfilePayload>,
) -> Result<Found, AppError> {
    app_state.profile_service.update(&acting, payload).await?;
    Ok(Found::to("/profile"))
}

#[utoipa::path(
    delete,
    path = "/profile",
    tag = "Profile",
    request_body(content = DeleteAccountPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Conta excluída, redireciona para /"),
        (status = 400, description = "Senha incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn destroy(
    State(app_state): State<AppState>,
    acting: AuthenticatedUser,
    Form(payload): Form<DeleteAccountPayload>,
) -> Result<Found, AppError> {
    app_state.profile_service.destroy(&acting, payload).await?;
    Ok(Found::to("/"))
}
