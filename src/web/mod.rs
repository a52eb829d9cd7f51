//! HTTP server for the report form.

pub mod error;
pub mod handlers;
pub mod render;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::ocr::TextRecognizer;
use crate::session::SessionStore;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub recognizer: Arc<dyn TextRecognizer>,
}

impl AppState {
    pub fn new(config: AppConfig, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl_secs),
            config: Arc::new(config),
            recognizer,
        }
    }
}

/// Builds the router: one route per form action.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/suggest", post(handlers::suggest))
        .route("/generate", post(handlers::generate))
        .route("/images/:index", get(handlers::thumbnail))
        .route("/reset", post(handlers::reset))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C.
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Report form listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::{png_bytes, FixedText};
    use crate::report::DOCX_MIME;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XECHOBOUNDARY";

    fn app(text: Option<&'static str>) -> Router {
        build_router(AppState::new(
            AppConfig::default(),
            Arc::new(FixedText(text)),
        ))
    }

    fn cookie_of(response: &Response) -> String {
        let value = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        value.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    async fn get_page(app: &Router, cookie: &str) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::get("/")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }

    fn multipart_body(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    /// Starts a session and uploads `count` images; returns the session cookie.
    async fn upload_images(app: &Router, count: usize) -> String {
        let first = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_of(&first);

        let files: Vec<(String, Vec<u8>)> = (0..count)
            .map(|i| (format!("echo{}.png", i + 1), png_bytes(10 + i as u32, 10)))
            .collect();
        let files: Vec<(&str, Vec<u8>)> =
            files.iter().map(|(n, d)| (n.as_str(), d.clone())).collect();

        let response = app
            .clone()
            .oneshot(
                Request::post("/upload")
                    .header(header::COOKIE, &cookie)
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", BOUNDARY),
                    )
                    .body(Body::from(multipart_body(&files)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        cookie
    }

    async fn post_form(app: &Router, uri: &str, cookie: &str, form: &str) -> Response {
        app.clone()
            .oneshot(
                Request::post(uri)
                    .header(header::COOKIE, cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_form_gated_on_upload() {
        let app = app(None);
        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(cookie_of(&response).starts_with("echo_report_session="));
        let html = body_text(response).await;
        assert!(html.contains(r#"action="/upload""#));
        assert!(!html.contains("Generate report"));
    }

    #[tokio::test]
    async fn test_upload_shows_thumbnails_and_form() {
        let app = app(None);
        let cookie = upload_images(&app, 3).await;

        let html = get_page(&app, &cookie).await;
        assert!(html.contains("Preview (3)"));
        assert!(html.contains("Generate report"));

        let thumb = app
            .clone()
            .oneshot(
                Request::get("/images/2")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(thumb.status(), StatusCode::OK);
        assert_eq!(thumb.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_thumbnail_out_of_range() {
        let app = app(None);
        let cookie = upload_images(&app, 1).await;
        let response = app
            .clone()
            .oneshot(
                Request::get("/images/5")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_suggest_prefills_ejection_fraction() {
        let app = app(Some("HR 70\nFE: 55.3 %"));
        let cookie = upload_images(&app, 2).await;

        let response = post_form(
            &app,
            "/suggest",
            &cookie,
            "patient_name=NILDA+RODRIGUEZ&ejection_fraction=&ef_default=&conclusion=ok",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let html = get_page(&app, &cookie).await;
        assert!(html.contains(r#"name="ejection_fraction" value="55.3""#));
    }

    #[tokio::test]
    async fn test_suggest_failure_is_field_error() {
        let app = app(None);
        let cookie = upload_images(&app, 1).await;

        let response = post_form(&app, "/suggest", &cookie, "patient_name=X").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let html = get_page(&app, &cookie).await;
        assert!(html.contains("Could not read the first image"));
        assert!(html.contains("Preview (1)"));
    }

    #[tokio::test]
    async fn test_generate_returns_docx_download() {
        let app = app(None);
        let cookie = upload_images(&app, 3).await;

        let response = post_form(
            &app,
            "/generate",
            &cookie,
            "patient_name=NILDA+RODRIGUEZ&ejection_fraction=60&ef_default=&conclusion=Normal",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("filename=\"Informe_NILDA_RODRIGUEZ.docx\""));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_generate_without_images_redirects() {
        let app = app(None);
        let first = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_of(&first);

        let response = post_form(&app, "/generate", &cookie, "patient_name=X").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_reset_starts_fresh_session() {
        let app = app(None);
        let cookie = upload_images(&app, 2).await;

        let response = post_form(&app, "/reset", &cookie, "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(
                Request::get("/")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(cookie_of(&response), cookie);
        let html = body_text(response).await;
        assert!(!html.contains("Preview"));
    }
}
