// File: src/cors.rs
// Purpose: CORS layer built from the [cors] config section

use axum::http::HeaderValue;
use reqbind::config::CorsConfig;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

/// Build the CORS layer. `*` allows any origin unless credentials are
/// allowed, in which case it is ignored. Invalid origins are skipped.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = config.allowed_origins.iter().any(|origin| origin == "*");
    if wildcard && config.allow_credentials {
        warn!("ignoring wildcard CORS origin while credentials are allowed");
    }

    let allow_origin = if wildcard && !config.allow_credentials {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter(|origin| origin.as_str() != "*")
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}
