// src/common/redirect.rs

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// 302 para um destino nomeado (ex: a listagem do recurso).
pub struct Found(pub String);

impl Found {
    pub fn to(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// "Voltar": usa o `Referer` quando ele existe, senão cai no destino padrão.
    pub fn back(headers: &HeaderMap, fallback: &str) -> Self {
        let location = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or(fallback);
        Self(location.to_string())
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        match HeaderValue::from_str(&self.0) {
            Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            // Referer com bytes inválidos vira "/"
            Err(_) => (StatusCode::FOUND, [(header::LOCATION, HeaderValue::from_static("/"))]).into_response(),
        }
    }
}
