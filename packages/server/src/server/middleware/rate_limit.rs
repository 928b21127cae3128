// Rate limiting using tower-governor
//
// Auth endpoints: 10 requests/sec per client IP with bursts of 20. Keys come
// from X-Forwarded-For / X-Real-IP when present, else the peer address, so the
// server must be served with connect info.

use std::sync::Arc;

use axum::Router;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tracing::warn;

use crate::server::app::AppState;

pub fn limit_auth_routes(router: Router<AppState>) -> Router<AppState> {
    let config = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(20)
        .key_extractor(SmartIpKeyExtractor)
        .finish();

    match config {
        Some(config) => router.layer(GovernorLayer {
            config: Arc::new(config),
        }),
        None => {
            warn!("Invalid rate limiter configuration; auth routes are not limited");
            router
        }
    }
}
