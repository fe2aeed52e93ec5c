// src/handlers/roles.rs

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
    middleware::rbac::{PermRolesCreate, PermRolesDelete, PermRolesEdit, PermRolesIndex, RequirePermission},
    models::rbac::{RoleCreateForm, RoleEditForm, RoleIndex, RolePayload},
};

// GET /roles (cargos já com as permissões)
#[utoipa::path(
    get,
    path = "/roles",
    tag = "Roles",
    params(ListQuery),
    responses((status = 200, description = "Cargos e suas permissões", body = RoleIndex)),
    security(("api_jwt" = []))
)]
pub async fn index(
    _guard: RequirePermission<PermRolesIndex>,
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RoleIndex>, AppError> {
    let page = app_state.role_service.index(ListFilter::from(&query)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/roles/create",
    tag = "Roles",
    responses((status = 200, description = "Permissões agrupadas por recurso", body = RoleCreateForm)),
    security(("api_jwt" = []))
)]
pub async fn create(
    _guard: RequirePermission<PermRolesCreate>,
    State(app_state): State<AppState>,
) -> Result<Json<RoleCreateForm>, AppError> {
    Ok(Json(app_state.role_service.create_form().await?))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "Roles",
    request_body(content = RolePayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Criado, redireciona para /roles"),
        (status = 400, description = "Nome inválido/repetido ou permissões inválidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn store(
    _guard: RequirePermission<PermRolesCreate>,
    State(app_state): State<AppState>,
    Form(payload): Form<RolePayload>,
) -> Result<Found, AppError> {
    app_state.role_service.create(payload).await?;
    Ok(Found::to("/roles"))
}

#[utoipa::path(
    get,
    path = "/roles/{id}/edit",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo, suas permissões e as opções agrupadas", body = RoleEditForm),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn edit(
    _guard: RequirePermission<PermRolesEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<RoleEditForm>, AppError> {
    Ok(Json(app_state.role_service.edit_form(id).await?))
}

#[utoipa::path(
    put,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    request_body(content = RolePayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Atualizado, redireciona para /roles"),
        (status = 400, description = "Nome inválido/repetido ou permissões inválidas"),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    _guard: RequirePermission<PermRolesEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
    Form(payload): Form<RolePayload>,
) -> Result<Found, AppError> {
    app_state.role_service.update(id, payload).await?;
    Ok(Found::to("/roles"))
}

#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 302, description = "Removido, volta para a página anterior"),
        (status = 403, description = "O cargo super-admin não pode ser removido"),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn destroy(
    _guard: RequirePermission<PermRolesDelete>,
    State(app_state): State<AppState>,
    headers: HeaderMap,
    PathId(id): PathId,
) -> Result<Found, AppError> {
    app_state.role_service.delete(id).await?;
    Ok(Found::back(&headers, "/roles"))
}
