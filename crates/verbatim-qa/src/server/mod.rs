//! HTTP server for the verbatim Q&A front-end

pub mod cookie;
pub mod page;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::VerbatimConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Front-end HTTP server
pub struct VerbatimServer {
    config: VerbatimConfig,
    state: AppState,
}

impl VerbatimServer {
    /// Create a new server
    pub fn new(config: VerbatimConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting verbatim UI on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Router for `state`; layers are applied bottom to top
pub fn build_router(state: AppState, config: &VerbatimConfig) -> Router {
    let max_upload = config.server.max_upload_size;

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(routes::ui_routes(max_upload))
        .nest("/api", routes::api_routes(max_upload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if config.server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::testing::sample_pdf;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use super::cookie::SESSION_COOKIE;
    use tower::ServiceExt;

    const BOUNDARY: &str = "verbatim-test-boundary";

    fn test_app(dir: &std::path::Path) -> Router {
        let config = VerbatimConfig {
            paths: PathsConfig::rooted_at(dir),
            ..Default::default()
        };
        let state = AppState::new(config.clone()).unwrap();
        build_router(state, &config)
    }

    fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, files: &[(&str, &[u8])], cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(multipart_body(files))).unwrap()
    }

    fn form_request(uri: &str, body: &str, cookie: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, cookie)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let set = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get_page(app: &Router, cookie: &str) -> String {
        let response = app
            .clone()
            .oneshot(Request::get("/").header(header::COOKIE, cookie).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_page_sets_session_and_shows_status() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(session_cookie(&response).starts_with(SESSION_COOKIE));
        let page = body_text(response).await;
        assert!(page.contains("new will be created on build"));
        assert!(page.contains("Save PDFs to folder"));
        assert!(dir.path().join("doc").is_dir());
    }

    #[tokio::test]
    async fn test_cookieless_page_views_store_no_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let config = VerbatimConfig {
            paths: PathsConfig::rooted_at(dir.path()),
            ..Default::default()
        };
        let state = AppState::new(config.clone()).unwrap();
        let app = build_router(state.clone(), &config);

        for _ in 0..50 {
            let response = app
                .clone()
                .oneshot(Request::get("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.session_count(), 0);

        // A session only exists once something is stored for it
        let response = app.clone().oneshot(multipart_request("/upload", &[], None)).await.unwrap();
        let cookie = session_cookie(&response);
        assert_eq!(state.session_count(), 1);
        get_page(&app, &cookie).await;
        assert_eq!(state.session_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_without_files_warns() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app.clone().oneshot(multipart_request("/upload", &[], None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let cookie = session_cookie(&response);
        let page = get_page(&app, &cookie).await;
        assert!(page.contains("Please select at least one PDF."));

        // Notices are shown once
        let page = get_page(&app, &cookie).await;
        assert!(!page.contains("Please select at least one PDF."));
    }

    #[tokio::test]
    async fn test_upload_build_and_ask_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let pdf = sample_pdf(&["The repo rate was raised to six percent."]);

        let response = app
            .clone()
            .oneshot(multipart_request("/upload", &[("policy.pdf", &pdf[..])], None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);
        assert!(dir.path().join("doc").join("policy.pdf").is_file());

        let response = app.clone().oneshot(form_request("/build", "", &cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let page = get_page(&app, &cookie).await;
        assert!(page.contains("Index built → "));
        assert!(page.contains("(exists)"));

        let response = app
            .clone()
            .oneshot(form_request("/ask", "question=What+is+the+repo+rate%3F", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let page = get_page(&app, &cookie).await;
        assert!(page.contains("<strong>You:</strong> What is the repo rate?"));
        assert!(page.contains("Sources:"));
    }

    #[tokio::test]
    async fn test_build_failure_shows_trace() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = format!("{}={}", SESSION_COOKIE, uuid::Uuid::new_v4());

        app.clone().oneshot(form_request("/build", "", &cookie)).await.unwrap();
        let page = get_page(&app, &cookie).await;

        assert!(page.contains("Index build failed."));
        assert!(page.contains("<pre><code>No PDFs found in"));
    }

    #[tokio::test]
    async fn test_ask_errors_go_to_history() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = format!("{}={}", SESSION_COOKIE, uuid::Uuid::new_v4());

        app.clone().oneshot(form_request("/ask", "question=+++", &cookie)).await.unwrap();
        assert!(!get_page(&app, &cookie).await.contains("History"));

        app.clone().oneshot(form_request("/ask", "question=repo+rate", &cookie)).await.unwrap();
        let page = get_page(&app, &cookie).await;
        assert!(page.contains("Backend error:"));
        assert!(page.contains("Index not found at"));
    }

    #[tokio::test]
    async fn test_api_ask_validation_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let ask = |body: &'static str| {
            Request::post("/api/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let response = app.clone().oneshot(ask(r#"{"question": "  "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("empty_question"));

        let response = app.clone().oneshot(ask(r#"{"question": "repo rate"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_documents_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let pdf = sample_pdf(&["Currency is issued by the central bank."]);

        let response = app
            .clone()
            .oneshot(multipart_request(
                "/api/documents",
                &[("currency.pdf", &pdf[..]), ("notes.txt", &b"plain"[..])],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["saved"], serde_json::json!(["currency.pdf"]));
        assert_eq!(body["rejected"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(Request::post("/api/index").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(status["index_exists"], true);
        assert_eq!(status["index"]["documents"], 1);
        assert_eq!(status["extractor"], "lexical");
    }
}
