//! Unit tests for the external collaborators

use bytes::Bytes;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use glowup_server::{
    backend::{
        cloudinary::{sign_params, CloudinaryHost},
        gotenberg::GotenbergRenderer,
        inline::InlineHost,
        openai::OpenAiVisionModel,
        traits::{ImageHost, PdfRenderer, VisionModel, VisionRequest},
    },
    config::{ImageHostConfig, ModelConfig, PdfConfig},
    upload::UploadedImage,
    AppError,
};

fn png_image() -> UploadedImage {
    UploadedImage {
        bytes: Bytes::from_static(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        content_type: "image/png".to_string(),
        file_name: Some("selfie.png".to_string()),
    }
}

fn cloudinary_config(base_url: &str) -> ImageHostConfig {
    ImageHostConfig {
        base_url: base_url.to_string(),
        cloud_name: "demo".to_string(),
        api_key: "123456".to_string(),
        api_secret: "shhh".to_string(),
        ..ImageHostConfig::default()
    }
}

#[tokio::test]
async fn test_inline_host_returns_data_url() {
    let hosted = InlineHost::new().upload(&png_image()).await.unwrap();
    assert_eq!(hosted.url, "data:image/png;base64,iVBORw0KGgo=");
    assert!(hosted.public_id.is_none());
}

#[test]
fn test_cloudinary_signature_known_value() {
    let mut params = BTreeMap::new();
    params.insert("timestamp", "1315060510".to_string());
    params.insert("public_id", "sample_image".to_string());
    params.insert("eager", "w_400,h_300,c_pad".to_string());

    let signature = sign_params(&params, "abcd");
    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(signature, sign_params(&params.clone(), "abcd"));
}

#[tokio::test]
async fn test_cloudinary_upload_sends_signed_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/glowup-ai/x.png",
            "public_id": "glowup-ai/x"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let host = CloudinaryHost::new(&cloudinary_config(&server.uri())).unwrap();
    let hosted = host.upload(&png_image()).await.unwrap();

    assert_eq!(
        hosted.url,
        "https://res.cloudinary.com/demo/image/upload/v1/glowup-ai/x.png"
    );
    assert_eq!(hosted.public_id.as_deref(), Some("glowup-ai/x"));

    let requests = server.received_requests().await.unwrap();
    let form = String::from_utf8_lossy(&requests[0].body);
    for field in ["file", "api_key", "signature", "timestamp", "folder"] {
        assert!(form.contains(&format!("name=\"{}\"", field)), "missing {field}");
    }
    assert!(form.contains("glowup-ai"));
    assert!(form.contains("sha256"));
}

#[tokio::test]
async fn test_cloudinary_rejection_is_image_host_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Signature"))
        .mount(&server)
        .await;

    let host = CloudinaryHost::new(&cloudinary_config(&server.uri())).unwrap();
    let err = host.upload(&png_image()).await.unwrap_err();
    assert!(matches!(err, AppError::ImageHost(message) if message.contains("401")));
}

#[tokio::test]
async fn test_openai_parses_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4-turbo-2024-04-09",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "<h1>Report</h1>"},
                "finish_reason": "length"
            }]
        })))
        .mount(&server)
        .await;

    let model = OpenAiVisionModel::new(&ModelConfig {
        base_url: format!("{}/v1/", server.uri()),
        api_key: "sk-test".to_string(),
        ..ModelConfig::default()
    })
    .unwrap();

    let response = model
        .complete(VisionRequest {
            prompt: "analyze".to_string(),
            image_url: "https://img.example/a.png".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.content, "<h1>Report</h1>");
    assert_eq!(response.model.as_deref(), Some("gpt-4-turbo-2024-04-09"));
    assert_eq!(response.finish_reason.as_deref(), Some("length"));
}

#[tokio::test]
async fn test_openai_error_status_is_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let model = OpenAiVisionModel::new(&ModelConfig {
        base_url: server.uri(),
        api_key: "sk-test".to_string(),
        ..ModelConfig::default()
    })
    .unwrap();

    let err = model
        .complete(VisionRequest {
            prompt: "analyze".to_string(),
            image_url: "https://img.example/a.png".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Model(message) if message.contains("429")));
}

#[tokio::test]
async fn test_gotenberg_returns_pdf_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forms/chromium/convert/html"))
        .and(body_string_contains("filename=\"index.html\""))
        .and(body_string_contains("<h1>Report</h1>"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let renderer = GotenbergRenderer::new(&PdfConfig {
        endpoint: server.uri(),
        ..PdfConfig::default()
    })
    .unwrap();

    let pdf = renderer.render("<h1>Report</h1>").await.unwrap();
    assert_eq!(pdf.as_ref(), b"%PDF-1.7");
}

#[tokio::test]
async fn test_gotenberg_failure_is_pdf_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let renderer = GotenbergRenderer::new(&PdfConfig {
        endpoint: server.uri(),
        ..PdfConfig::default()
    })
    .unwrap();

    let err = renderer.render("<h1>Report</h1>").await.unwrap_err();
    assert!(matches!(err, AppError::Pdf(_)));
}
