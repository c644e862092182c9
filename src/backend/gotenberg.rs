//! Gotenberg HTML to PDF client

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::PdfRenderer;
use crate::config::PdfConfig;
use crate::error::{AppError, Result};

/// A4 in inches
const PAPER_WIDTH: &str = "8.27";
const PAPER_HEIGHT: &str = "11.7";

/// Renders PDFs through a Gotenberg instance
pub struct GotenbergRenderer {
    client: Client,
    endpoint: String,
}

impl GotenbergRenderer {
    /// Create a new renderer from configuration
    pub fn new(config: &PdfConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PdfRenderer for GotenbergRenderer {
    fn name(&self) -> &str {
        "gotenberg"
    }

    async fn render(&self, html: &str) -> Result<Bytes> {
        let url = format!("{}/forms/chromium/convert/html", self.endpoint);

        let index = Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html")?;
        let form = Form::new()
            .part("files", index)
            .text("printBackground", "true")
            .text("paperWidth", PAPER_WIDTH)
            .text("paperHeight", PAPER_HEIGHT);

        debug!(url = %url, size = html.len(), "Sending HTML to Gotenberg");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Pdf(format!("Gotenberg request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gotenberg conversion failed");
            return Err(AppError::Pdf(format!("Gotenberg returned {}: {}", status, body)));
        }

        response
            .bytes()
            .await
            .map_err(|e| AppError::Pdf(format!("Failed to read PDF body: {}", e)))
    }
}
