// src/handlers/users.rs

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListFilter, ListQuery},
        path_id::PathId,
        redirect::Found,
    },
    config::AppState,
    middleware::rbac::{PermUsersCreate, PermUsersDelete, PermUsersEdit, PermUsersIndex, RequirePermission},
    models::auth::{CreateUserPayload, UpdateUserPayload, UserCreateForm, UserEditForm, UserIndex},
};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListQuery),
    responses((status = 200, description = "Usuários e seus cargos", body = UserIndex)),
    security(("api_jwt" = []))
)]
pub async fn index(
    _guard: RequirePermission<PermUsersIndex>,
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserIndex>, AppError> {
    let page = app_state.user_service.index(ListFilter::from(&query)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/users/create",
    tag = "Users",
    responses((status = 200, description = "Todos os cargos disponíveis", body = UserCreateForm)),
    security(("api_jwt" = []))
)]
pub async fn create(
    _guard: RequirePermission<PermUsersCreate>,
    State(app_state): State<AppState>,
) -> Result<Json<UserCreateForm>, AppError> {
    Ok(Json(app_state.user_service.create_form().await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body(content = CreateUserPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Criado, redireciona para /users"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn store(
    _guard: RequirePermission<PermUsersCreate>,
    State(app_state): State<AppState>,
    Form(payload): Form<CreateUserPayload>,
) -> Result<Found, AppError> {
    app_state.user_service.create(payload).await?;
    Ok(Found::to("/users"))
}

// O super-admin fica de fora das opções
#[utoipa::path(
    get,
    path = "/users/{id}/edit",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário, seus cargos e as opções", body = UserEditForm),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn edit(
    _guard: RequirePermission<PermUsersEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<UserEditForm>, AppError> {
    Ok(Json(app_state.user_service.edit_form(id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body(content = UpdateUserPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Atualizado, redireciona para /users"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    _guard: RequirePermission<PermUsersEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
    Form(payload): Form<UpdateUserPayload>,
) -> Result<Found, AppError> {
    app_state.user_service.update(id, payload).await?;
    Ok(Found::to("/users"))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 302, description = "Removido, volta para a página anterior"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn destroy(
    _guard: RequirePermission<PermUsersDelete>,
    State(app_state): State<AppState>,
    headers: HeaderMap,
    PathId(id): PathId,
) -> Result<Found, AppError> {
    app_state.user_service.delete(id).await?;
    Ok(Found::back(&headers, "/users"))
}
