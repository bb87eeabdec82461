//! HTTP routes.
//!
//! Every route answers at the root and, when a root path is configured
//! (`/api/1` by default), under that prefix as well.

pub mod extract;
pub mod handlers;

use crate::config::ServeConfig;
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::health))
        .route("/ping", get(handlers::ping))
        .route("/items/:item_id", get(handlers::read_item))
        .route(
            "/sensors",
            get(handlers::list_sensors).post(handlers::create_sensor),
        )
        .route("/sensors/:sensor_id", get(handlers::get_sensor))
        .route("/sensors/:sensor_id/data", get(handlers::list_sensor_data))
        .route("/sensor-data", post(handlers::create_sensor_data))
        .route("/notify", post(handlers::notify))
}

/// Normalize a configured prefix to `/segment[/segment]`, or `None` for the root.
pub fn normalize_root_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{}", trimmed))
    }
}

/// Build the CORS layer from a comma-separated origin list.
///
/// `*` allows any origin without credentials. Explicit origins are mirrored
/// back with credentials allowed.
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let origins = origins.trim();
    if origins.is_empty() || origins == "*" {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            match trimmed.parse::<HeaderValue>() {
                Ok(hv) => Some(hv),
                Err(e) => {
                    warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();
    info!(count = allowed.len(), "CORS: explicit origins configured");

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_app(state: AppState, config: &ServeConfig) -> Router {
    let api = routes();
    let router = match normalize_root_path(&config.root_path) {
        Some(prefix) => Router::new().merge(api.clone()).nest(&prefix, api),
        None => api,
    };

    router
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::response::Response;
    use tower::ServiceExt;

    async fn preflight(cors: CorsLayer, origin: &str) -> Response {
        let app: Router = Router::new().route("/ping", get(|| async { "pong" })).layer(cors);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn explicit_origin_is_echoed_with_credentials() {
        let response = preflight(build_cors_layer("https://a.example"), "https://a.example").await;
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://a.example"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "POST"
        );
    }

    #[tokio::test]
    async fn unlisted_origin_is_not_allowed() {
        let response = preflight(
            build_cors_layer("https://a.example, https://b.example"),
            "https://evil.example",
        )
        .await;
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin_without_credentials() {
        let response = preflight(build_cors_layer("*"), "https://anywhere.example").await;
        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn root_path_is_normalized() {
        assert_eq!(normalize_root_path("/api/1"), Some("/api/1".to_string()));
        assert_eq!(normalize_root_path("api/1/"), Some("/api/1".to_string()));
        assert_eq!(normalize_root_path("/"), None);
        assert_eq!(normalize_root_path(""), None);
    }
}
