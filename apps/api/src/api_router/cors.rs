use axum::http::Method;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Embedding hosts send credentialed requests from their own origin with
/// arbitrary headers.
pub(super) fn build_cors_layer(supports_credentials: bool) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(supports_credentials)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::build_cors_layer;

    #[tokio::test]
    async fn preflight_mirrors_origin_and_requested_headers() {
        let app = Router::new()
            .route("/auth/me", get(|| async { StatusCode::OK }))
            .layer(build_cors_layer(true));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/auth/me")
            .header("origin", "https://portal.example.com")
            .header("access-control-request-method", "GET")
            .header("access-control-request-headers", "x-embed-token,content-type")
            .body(Body::empty());
        let Ok(request) = request else {
            panic!("request should build");
        };

        let response = match app.oneshot(request).await {
            Ok(response) => response,
            Err(error) => panic!("preflight should succeed: {error}"),
        };
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned)
        };

        assert_eq!(
            header("access-control-allow-origin").as_deref(),
            Some("https://portal.example.com")
        );
        assert_eq!(
            header("access-control-allow-headers").as_deref(),
            Some("x-embed-token,content-type")
        );
        assert_eq!(
            header("access-control-allow-credentials").as_deref(),
            Some("true")
        );
    }
}
