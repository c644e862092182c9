//! Response bodies of the HTTP API

use serde::Serialize;

use crate::report::{Insight, Report};

/// `POST /analyze` response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Full report HTML
    pub result: String,
    /// Same document as `result`, under the name newer clients read
    pub full_html: String,
    pub preview_html: String,
    pub image_url: String,
    pub top_concerns: Vec<String>,
    pub am_preview: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preview_insights: Vec<Insight>,
}

impl AnalyzeResponse {
    pub fn new(report: Report, image_url: String) -> Self {
        Self {
            full_html: report.html.clone(),
            result: report.html,
            preview_html: report.preview_html,
            image_url,
            top_concerns: report.top_concerns,
            am_preview: report.am_preview,
            preview_insights: report.insights,
        }
    }
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
