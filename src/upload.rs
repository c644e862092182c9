//! Multipart intake for the analyze endpoint

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::debug;

use crate::error::{AppError, Result};

/// Image received from the client, alive for one request only
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl UploadedImage {
    /// Subtype of the MIME type, e.g. `png` for `image/png`
    pub fn format(&self) -> &str {
        self.content_type
            .strip_prefix("image/")
            .unwrap_or("png")
    }
}

/// Parsed `POST /analyze` form
#[derive(Debug, Clone)]
pub struct AnalyzeForm {
    pub image: UploadedImage,
    pub name: Option<String>,
    pub age: Option<u8>,
}

/// Read the `image`, `name` and `age` fields. Unknown fields are skipped.
pub async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeForm> {
    let mut image = None;
    let mut name = None;
    let mut age = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let field_name = field.name().map(str::to_owned);

        match field_name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_owned);
                let declared = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read image", e))?;

                if bytes.is_empty() {
                    continue;
                }

                let content_type = resolve_content_type(declared.as_deref(), &bytes)?;
                debug!(
                    size = bytes.len(),
                    content_type = %content_type,
                    "Received image upload"
                );

                image = Some(UploadedImage {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            Some("name") => {
                name = non_blank(read_text(field).await?);
            }
            Some("age") => {
                age = match non_blank(read_text(field).await?) {
                    Some(raw) => Some(parse_age(&raw)?),
                    None => None,
                };
            }
            _ => continue,
        }
    }

    let image = image.ok_or(AppError::MissingImage)?;

    Ok(AnalyzeForm { image, name, age })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| multipart_error("Malformed form field", e))
}

/// Body-limit overruns stay 413, everything else is a bad request
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidRequest(format!("{}: {}", context, e.body_text()))
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_age(raw: &str) -> Result<u8> {
    match raw.parse::<u8>() {
        Ok(age) if (1..=120).contains(&age) => Ok(age),
        _ => Err(AppError::InvalidRequest(format!(
            "Age must be a whole number between 1 and 120, got '{}'",
            raw
        ))),
    }
}

/// Trust a declared `image/*` type, otherwise sniff the bytes
fn resolve_content_type(declared: Option<&str>, data: &[u8]) -> Result<String> {
    if let Some(declared) = declared {
        if declared.starts_with("image/") {
            return Ok(declared.to_string());
        }
    }

    detect_image_format(data)
        .map(|format| format!("image/{}", format))
        .ok_or_else(|| AppError::InvalidRequest("Uploaded file is not an image".to_string()))
}

/// Detect image format from binary data using magic bytes
pub fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpeg");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    if data.starts_with(b"BM") {
        return Some("bmp");
    }

    None
}
