// src/common/path_id.rs

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::common::error::AppError;

/// `{id}` da rota. Um id que nem é UUID não pode existir: vira 404, como um id desconhecido.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Registro"))?;

        Uuid::parse_str(&raw)
            .map(PathId)
            .map_err(|_| AppError::NotFound("Registro"))
    }
}
