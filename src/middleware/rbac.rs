// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn name() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let acting = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        // Consulta o banco a cada requisição
        app_state.access_service.authorize(&acting.user, T::name()).await?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($ty:ident, $name:literal) => {
        pub struct $ty;
        impl PermissionDef for $ty {
            fn name() -> &'static str {
                $name
            }
        }
    };
}

permission!(PermPermissionsIndex, "permissions index");
permission!(PermPermissionsCreate, "permissions create");
permission!(PermPermissionsEdit, "permissions edit");
permission!(PermPermissionsDelete, "permissions delete");

permission!(PermRolesIndex, "roles index");
permission!(PermRolesCreate, "roles create");
permission!(PermRolesEdit, "roles edit");
permission!(PermRolesDelete, "roles delete");

permission!(PermUsersIndex, "users index");
permission!(PermUsersCreate, "users create");
permission!(PermUsersEdit, "users edit");
permission!(PermUsersDelete, "users delete");
