use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::storage::DiagnosticsStore;

use super::handlers::{
    get_aggregated, get_diagnostic, get_statistics, health_check, list_diagnostics, login,
    verify, AppState,
};

pub fn create_api_router(
    store: Arc<dyn DiagnosticsStore>,
    auth_service: Arc<AuthService>,
) -> Router {
    let state = Arc::new(AppState { store });

    let gate = Arc::clone(&auth_service);
    let protected_routes = Router::new()
        .route("/diagnostics", get(list_diagnostics))
        .route("/diagnostics/aggregate", get(get_aggregated))
        .route("/diagnostics/statistics", get(get_statistics))
        .route("/diagnostics/{id}", get(get_diagnostic))
        .route_layer(middleware::from_fn(move |headers, req, next| {
            let auth = Arc::clone(&gate);
            auth_middleware(auth, headers, req, next)
        }))
        .with_state(state);

    let auth_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .with_state(auth_service);

    Router::new().nest(
        "/api",
        Router::new()
            .route("/health", get(health_check))
            .merge(protected_routes)
            .merge(auth_routes)
            .layer(CorsLayer::permissive()),
    )
}
