// src/handlers/permissions.rs

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
    middleware::rbac::{
        PermPermissionsCreate, PermPermissionsDelete, PermPermissionsEdit, PermPermissionsIndex, RequirePermission,
    },
    models::rbac::{PermissionEdit, PermissionIndex, PermissionPayload},
};

// GET /permissions
#[utoipa::path(
    get,
    path = "/permissions",
    tag = "Permissions",
    params(ListQuery),
    responses(
        (status = 200, description = "Permissões, mais recentes primeiro", body = PermissionIndex),
        (status = 403, description = "Sem a permissão 'permissions index'")
    ),
    security(("api_jwt" = []))
)]
pub async fn index(
    _guard: RequirePermission<PermPermissionsIndex>,
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PermissionIndex>, AppError> {
    let page = app_state.permission_service.index(ListFilter::from(&query)).await?;
    Ok(Json(page))
}

// GET /permissions/create (o formulário não precisa de dados)
#[utoipa::path(
    get,
    path = "/permissions/create",
    tag = "Permissions",
    responses((status = 200, description = "Formulário vazio")),
    security(("api_jwt" = []))
)]
pub async fn create(_guard: RequirePermission<PermPermissionsCreate>) -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

#[utoipa::path(
    post,
    path = "/permissions",
    tag = "Permissions",
    request_body(content = PermissionPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Criada, redireciona para /permissions"),
        (status = 400, description = "Nome inválido ou repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn store(
    _guard: RequirePermission<PermPermissionsCreate>,
    State(app_state): State<AppState>,
    Form(payload): Form<PermissionPayload>,
) -> Result<Found, AppError> {
    app_state.permission_service.create(payload).await?;
    Ok(Found::to("/permissions"))
}

#[utoipa::path(
    get,
    path = "/permissions/{id}/edit",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "Permissão a editar", body = PermissionEdit),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn edit(
    _guard: RequirePermission<PermPermissionsEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<PermissionEdit>, AppError> {
    let permission = app_state.permission_service.find(id).await?;
    Ok(Json(PermissionEdit { permission }))
}

#[utoipa::path(
    put,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "ID da permissão")),
    request_body(content = PermissionPayload, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Atualizada, redireciona para /permissions"),
        (status = 400, description = "Nome inválido ou repetido"),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    _guard: RequirePermission<PermPermissionsEdit>,
    State(app_state): State<AppState>,
    PathId(id): PathId,
    Form(payload): Form<PermissionPayload>,
) -> Result<Found, AppError> {
    app_state.permission_service.update(id, payload).await?;
    Ok(Found::to("/permissions"))
}

#[utoipa::path(
    delete,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "ID da permissão")),
    responses(
        (status = 302, description = "Removida, volta para a página anterior"),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn destroy(
    _guard: RequirePermission<PermPermissionsDelete>,
    State(app_state): State<AppState>,
    headers: HeaderMap,
    PathId(id): PathId,
) -> Result<Found, AppError> {
    app_state.permission_service.delete(id).await?;
    Ok(Found::back(&headers, "/permissions"))
}
