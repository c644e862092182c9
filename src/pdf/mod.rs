//! Printable report rendering

use bytes::Bytes;
use minijinja::{context, Environment};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::backend::traits::PdfRenderer;
use crate::error::{AppError, Result};
use crate::report::{postprocess, sections};

const REPORT_TEMPLATE_NAME: &str = "report.html";
const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");

/// Concerns arrive either as a list or as the raw summary text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopConcerns {
    List(Vec<String>),
    Text(String),
}

impl TopConcerns {
    fn into_vec(self) -> Vec<String> {
        match self {
            TopConcerns::List(list) => list
                .into_iter()
                .map(|c| sections::strip_tags(&c))
                .filter(|c| !c.is_empty())
                .collect(),
            TopConcerns::Text(text) => sections::split_concerns(&text),
        }
    }
}

/// `POST /generate-pdf` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfRequest {
    pub image_url: String,
    /// Report HTML as returned by `/analyze`
    pub analysis: String,
    pub top_concerns: Option<TopConcerns>,
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub date: Option<String>,
}

/// Fills the report template and hands it to a renderer
pub struct PdfService {
    env: Environment<'static>,
    renderer: Arc<dyn PdfRenderer>,
    filename: String,
}

impl PdfService {
    pub fn new(renderer: Arc<dyn PdfRenderer>, filename: String) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)?;
        Ok(Self {
            env,
            renderer,
            filename,
        })
    }

    /// Download name sent in `Content-Disposition`
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Build the printable HTML document
    pub fn render_html(&self, request: PdfRequest) -> Result<String> {
        if request.image_url.trim().is_empty() {
            return Err(AppError::InvalidRequest("imageUrl is required".to_string()));
        }
        if request.analysis.trim().is_empty() {
            return Err(AppError::InvalidRequest("analysis is required".to_string()));
        }

        let analysis = postprocess::sanitize(&request.analysis);
        let top_concerns = match request.top_concerns {
            Some(concerns) => concerns.into_vec(),
            None => sections::top_concerns(&analysis),
        };
        let date = request
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

        let html = self.env.get_template(REPORT_TEMPLATE_NAME)?.render(context! {
            image_url => request.image_url,
            analysis => analysis,
            top_concerns => top_concerns,
            name => request.name,
            birthdate => request.birthdate,
            date => date,
        })?;

        Ok(html)
    }

    /// Render the request into PDF bytes
    pub async fn render(&self, request: PdfRequest) -> Result<Bytes> {
        let html = self.render_html(request)?;
        let pdf = self.renderer.render(&html).await?;

        info!(renderer = %self.renderer.name(), size = pdf.len(), "Rendered PDF report");
        Ok(pdf)
    }
}
