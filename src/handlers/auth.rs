// src/handlers/auth.rs

use axum::{extract::State, Json};
use axum_extra::extract::Form;

use crate::{
    common::{error::AppError, redirect::Found},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginUserPayload, MeResponse},
};

// Handler de login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body(content = LoginUserPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Form(payload): Form<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let token = app_state.auth_service.login_user(&payload).await?;
    Ok(Json(AuthResponse { token }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 302, description = "Sessão encerrada, redireciona para /")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    acting: AuthenticatedUser,
) -> Result<Found, AppError> {
    app_state.auth_service.logout(acting.session_id).await?;
    Ok(Found::to("/"))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Usuário logado, cargos e permissões efetivas", body = MeResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
) -> Result<Json<MeResponse>, AppError> {
    let roles = app_state.access_service.role_names(user.id).await?;
    let permissions = app_state.access_service.effective_permissions(user.id).await?;

    Ok(Json(MeResponse {
        user,
        roles,
        permissions: permissions.into_iter().collect(),
    }))
}
