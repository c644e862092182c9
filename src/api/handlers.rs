//! Request handlers

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::api::models::{AnalyzeResponse, HealthResponse};
use crate::backend::traits::VisionRequest;
use crate::error::{AppError, Result};
use crate::pdf::PdfRequest;
use crate::report::prompt::Subject;
use crate::upload::read_analyze_form;
use crate::AppState;

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Upload a selfie, run the analysis and return the report
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>> {
    let multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let span = info_span!("analyze", request_id = %Uuid::new_v4());

    async move {
        let form = read_analyze_form(multipart).await?;
        info!(
            size = form.image.bytes.len(),
            content_type = %form.image.content_type,
            has_name = form.name.is_some(),
            age = ?form.age,
            "Received analyze request"
        );

        let hosted = state.image_host.upload(&form.image).await?;
        info!(host = %state.image_host.name(), public_id = ?hosted.public_id, "Image hosted");

        let prompt = state.prompt.render(&Subject {
            name: form.name,
            age: form.age,
        })?;

        let report = state
            .analyzer
            .analyze(VisionRequest {
                prompt,
                image_url: hosted.url.clone(),
            })
            .await?;

        Ok::<_, AppError>(Json(AnalyzeResponse::new(report, hosted.url)))
    }
    .instrument(span)
    .await
}

/// Render a finished report as a downloadable PDF
pub async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<PdfRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let span = info_span!("generate_pdf", request_id = %Uuid::new_v4());

    async move {
        let pdf = state.pdf.render(request).await?;
        let disposition = format!("attachment; filename=\"{}\"", state.pdf.filename());
        let disposition = HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(format!("Invalid download filename: {}", e)))?;

        Ok::<_, AppError>((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            pdf,
        )
            .into_response())
    }
    .instrument(span)
    .await
}
