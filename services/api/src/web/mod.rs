pub mod analyze;
pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use analyze::analyze_mood_handler;
pub use middleware::require_auth;
pub use rest::{create_entry_handler, delete_entry_handler, list_entries_handler, update_entry_handler};

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::web::{
    auth::{login_handler, logout_handler, session_handler, signup_handler},
    state::AppState,
};

/// Builds the full API router: the public analysis endpoint, the auth routes and
/// the session-protected entry routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    // The analysis endpoint is called cross-origin without credentials, so every
    // response carries a wildcard origin.
    let analysis_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ]);

    let app_cors = CorsLayer::new()
        .allow_origin(app_state.config.frontend_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let analysis_routes = Router::new()
        .route("/analyze-mood", post(analyze_mood_handler))
        .layer(analysis_cors);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/session", get(session_handler))
        .route("/entries", get(list_entries_handler).post(create_entry_handler))
        .route(
            "/entries/{id}",
            put(update_entry_handler).delete(delete_entry_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let app_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(app_cors);

    Router::new()
        .merge(analysis_routes)
        .merge(app_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(app_state)
}
