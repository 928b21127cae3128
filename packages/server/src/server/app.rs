//! Application setup and server configuration.

use std::sync::Arc;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::limit_auth_routes;
use crate::server::routes::{auth, favorites, health_handler, profile, properties};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// Mark the session cookie `Secure`. Off only for plain-HTTP local runs.
    pub secure_cookies: bool,
}

/// Router-level switches that vary between production and tests.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub rate_limit_enabled: bool,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    // Cookies only travel cross-origin with credentials, which needs an explicit origin list.
    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Build the Axum application router
pub fn build_app(state: AppState, options: AppOptions) -> Router {
    let auth_routes = if options.rate_limit_enabled {
        limit_auth_routes(auth::router())
    } else {
        auth::router()
    };

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/properties", properties::router())
        .nest("/favorites", favorites::router())
        .nest("/profile", profile::router())
        .route("/health", get(health_handler))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
