// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn router(app_state: AppState) -> Router {
    let permission_routes = Router::new()
        .route("/", get(handlers::permissions::index).post(handlers::permissions::store))
        .route("/create", get(handlers::permissions::create))
        .route(
            "/{id}",
            put(handlers::permissions::update).delete(handlers::permissions::destroy),
        )
        .route("/{id}/edit", get(handlers::permissions::edit));

    let role_routes = Router::new()
        .route("/", get(handlers::roles::index).post(handlers::roles::store))
        .route("/create", get(handlers::roles::create))
        .route("/{id}", put(handlers::roles::update).delete(handlers::roles::destroy))
        .route("/{id}/edit", get(handlers::roles::edit));

    let user_routes = Router::new()
        .route("/", get(handlers::users::index).post(handlers::users::store))
        .route("/create", get(handlers::users::create))
        .route("/{id}", put(handlers::users::update).delete(handlers::users::destroy))
        .route("/{id}/edit", get(handlers::users::edit));

    // Tudo aqui exige sessão válida
    let protected_routes = Router::new()
        .nest("/permissions", permission_routes)
        .nest("/roles", role_routes)
        .nest("/users", user_routes)
        .route(
            "/profile",
            get(handlers::profile::edit)
                .patch(handlers::profile::update)
                .delete(handlers::profile::destroy),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected_routes)
        .with_state(app_state)
}
