//! Functional tests for the PDF endpoint

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use glowup_server::{
    api::create_router,
    backend::{inline::InlineHost, traits::PdfRenderer},
    backend::openai::OpenAiVisionModel,
    config::Settings,
    AppError, AppState, Result,
};

/// Records the HTML it was given and returns a fixed document
#[derive(Default)]
struct CapturingRenderer {
    html: Mutex<Option<String>>,
}

#[async_trait]
impl PdfRenderer for CapturingRenderer {
    fn name(&self) -> &str {
        "capturing"
    }

    async fn render(&self, html: &str) -> Result<Bytes> {
        *self.html.lock().unwrap() = Some(html.to_string());
        Ok(Bytes::from_static(b"%PDF-1.7 test"))
    }
}

struct FailingRenderer;

#[async_trait]
impl PdfRenderer for FailingRenderer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn render(&self, _html: &str) -> Result<Bytes> {
        Err(AppError::Pdf("chromium exited with status 1".to_string()))
    }
}

fn create_app(renderer: Arc<dyn PdfRenderer>) -> Router {
    let mut settings = Settings::default();
    settings.rate_limit.enabled = false;
    settings.model.api_key = "sk-test".to_string();

    let model = Arc::new(OpenAiVisionModel::new(&settings.model).unwrap());
    let state = AppState::new(settings, Arc::new(InlineHost::new()), model, renderer).unwrap();
    create_router(Arc::new(state))
}

fn pdf_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-pdf")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn report_body() -> Value {
    json!({
        "imageUrl": "https://res.cloudinary.com/demo/image/upload/abc.png",
        "analysis": "<h2>✨ Final Summary</h2><ul><li><strong>Top 3 Concerns:</strong> Pores<br>Redness</li></ul>",
        "name": "Mina",
        "birthdate": "1995-04-12",
        "date": "2024-06-01"
    })
}

#[tokio::test]
async fn test_generate_pdf_returns_attachment() {
    let renderer = Arc::new(CapturingRenderer::default());
    let app = create_app(renderer.clone());

    let response = app.oneshot(pdf_request(report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"glowup_report.pdf\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), b"%PDF-1.7 test");

    let html = renderer.html.lock().unwrap().clone().unwrap();
    assert!(html.contains("https://res.cloudinary.com/demo/image/upload/abc.png"));
    assert!(html.contains("Name: Mina"));
    assert!(html.contains("Birthdate: 1995-04-12"));
    assert!(html.contains("Analysis date: 2024-06-01"));
    assert!(html.contains("<div class=\"concern\">Pores</div>"));
    assert!(html.contains("<div class=\"concern\">Redness</div>"));
}

#[tokio::test]
async fn test_explicit_concerns_win() {
    let renderer = Arc::new(CapturingRenderer::default());
    let app = create_app(renderer.clone());

    let mut body = report_body();
    body["topConcerns"] = json!(["Dryness", "Dullness"]);
    let response = app.oneshot(pdf_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = renderer.html.lock().unwrap().clone().unwrap();
    assert!(html.contains("<div class=\"concern\">Dryness</div>"));
    assert!(!html.contains("<div class=\"concern\">Pores</div>"));
}

#[tokio::test]
async fn test_missing_image_url_is_rejected() {
    let app = create_app(Arc::new(CapturingRenderer::default()));

    let mut body = report_body();
    body.as_object_mut().unwrap().remove("imageUrl");
    let response = app.oneshot(pdf_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = create_app(Arc::new(CapturingRenderer::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/generate-pdf")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_renderer_failure_is_generic_500() {
    let app = create_app(Arc::new(FailingRenderer));

    let response = app.oneshot(pdf_request(report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["message"], "Failed to generate PDF");
    assert!(!body.to_string().contains("chromium"));
}
