//! # HTTP Flows
//!
//! Reporter upload and client download through the router, with rebuilds on
//! the background worker.

#[cfg(test)]
mod tests {
    use crate::fixtures::Pipeline;
    use axum::body::{Body, Bytes};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use ha_02_contagion_filter::{ContagionFilter, FilterConfig};
    use ha_05_api_gateway::FILTER_VERSION_HEADER;
    use shared_types::{Epoch, Seed, SEED_LENGTH};
    use tower::ServiceExt;

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let version = response
            .headers()
            .get(FILTER_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, version, body)
    }

    fn upload(token: &str, data: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add_contagious")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"authorization":"{token}","data":{data}}}"#
            )))
            .unwrap()
    }

    fn download() -> Request<Body> {
        Request::builder().uri("/filter").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let p = Pipeline::scheduled(FilterConfig::default());
        let (app, _) = p.router(false);

        let (status, version, _) = call(&app, download()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(version.as_deref(), Some("0"));

        let data = format!(
            r#"[{{"epoch":100,"seed":"{}"}},{{"epoch":101,"seed":"{}"}}]"#,
            "aa".repeat(16),
            "bb".repeat(16)
        );
        let token = p.token();
        let (status, _, body) = call(&app, upload(token.as_str(), &data)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"OK");

        p.settle(p.store.generation()).await;
        let (status, version, body) = call(&app, download()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(version.as_deref(), Some("1"));

        let filter = ContagionFilter::decode(&body).unwrap();
        assert!(filter.contains_record(Epoch(100), &Seed::new([0xaa; SEED_LENGTH])));
        assert!(filter.contains_record(Epoch(101), &Seed::new([0xbb; SEED_LENGTH])));
    }

    #[tokio::test]
    async fn test_malformed_record_rejects_whole_upload() {
        let p = Pipeline::scheduled(FilterConfig::default());
        let (app, _) = p.router(false);

        let data = format!(
            r#"[{{"epoch":100,"seed":"{}"}},{{"epoch":-5,"seed":"{}"}}]"#,
            "aa".repeat(16),
            "bb".repeat(16)
        );
        let token = p.token();
        let (status, _, _) = call(&app, upload(token.as_str(), &data)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(p.store.is_empty());

        // The token was not spent by the rejected upload
        let data = format!(r#"[{{"epoch":100,"seed":"{}"}}]"#, "aa".repeat(16));
        let (status, _, _) = call(&app, upload(token.as_str(), &data)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_replayed_token_is_unauthorized() {
        let p = Pipeline::scheduled(FilterConfig::default());
        let (app, _) = p.router(false);
        let token = p.token();
        let data = format!(r#"[{{"epoch":1,"seed":"{}"}}]"#, "01".repeat(16));

        let (first, _, _) = call(&app, upload(token.as_str(), &data)).await;
        let (second, _, _) = call(&app, upload(token.as_str(), &data)).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::UNAUTHORIZED);
        assert_eq!(p.store.generation(), 1);
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let p = Pipeline::inline(FilterConfig::default());
        let (app, _) = p.router(false);
        let request = Request::builder().uri("/version").body(Body::empty()).unwrap();
        let (status, _, body) = call(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "version": "1" }));
    }

    #[tokio::test]
    async fn test_debug_shutdown() {
        let p = Pipeline::inline(FilterConfig::default());
        let (app, mut shutdown_rx) = p.router(true);
        let request = Request::builder().uri("/shutdown").body(Body::empty()).unwrap();

        let (status, _, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"Server shutting down...");
        shutdown_rx.wait_for(|stop| *stop).await.unwrap();
    }
}
