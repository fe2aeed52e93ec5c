// src/models/rbac.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::{Filters, Page};

/// Cargo reservado: concedido fora do painel e nunca oferecido na edição de usuário.
pub const SUPER_ADMIN_ROLE: &str = "super-admin";

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "users index")]
    pub name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "analyst")]
    pub name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cargo + permissões já carregadas (listagem e edição)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,

    pub permissions: Vec<Permission>,
}

/// Item de um grupo de permissões no formulário de cargo.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PermissionOption {
    pub id: Uuid,
    pub name: String,
}

/// Permissões agrupadas pela primeira palavra do nome ("users index" -> "users").
pub type PermissionGroups = BTreeMap<String, Vec<PermissionOption>>;

// ---
// Payloads (form-urlencoded)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PermissionPayload {
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    #[schema(example = "reports view")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RolePayload {
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    #[schema(example = "analyst")]
    pub name: String,

    // Nomes das permissões marcadas no formulário (o front antigo manda `selectedPermissions`)
    #[serde(default, alias = "selectedPermissions")]
    #[validate(length(min = 1, message = "Selecione ao menos uma permissão."))]
    #[schema(example = json!(["reports view"]))]
    pub selected_permissions: Vec<String>,
}

// ---
// Respostas (as "páginas" do painel)
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionIndex {
    pub permissions: Page<Permission>,
    pub filters: Filters,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionEdit {
    pub permission: Permission,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleIndex {
    pub roles: Page<RoleWithPermissions>,
    pub filters: Filters,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleCreateForm {
    #[schema(value_type = Object)]
    pub permissions: PermissionGroups,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleEditForm {
    pub role: RoleWithPermissions,
    #[schema(value_type = Object)]
    pub permissions: PermissionGroups,
}
