//! GlowUp skin report service
//!
//! Accepts a selfie, has a vision model write a skin report about it and
//! turns finished reports into downloadable PDFs.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pdf;
pub mod report;
pub mod upload;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::openai::OpenAiVisionModel;
use backend::traits::{ImageHost, PdfRenderer, VisionModel};
use config::Settings;
use pdf::PdfService;
use report::analyzer::Analyzer;
use report::prompt::PromptBuilder;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub image_host: Arc<dyn ImageHost>,
    pub analyzer: Analyzer,
    pub prompt: PromptBuilder,
    pub pdf: PdfService,
}

impl AppState {
    /// Wire up the collaborators named in the configuration
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let image_host = backend::image_host_from_config(&settings.image_host)?;
        let model = Arc::new(OpenAiVisionModel::new(&settings.model)?);
        let renderer = backend::pdf_renderer_from_config(&settings.pdf)?;

        Self::new(settings, image_host, model, renderer)
    }

    /// Build the state around explicit collaborators
    pub fn new(
        settings: Settings,
        image_host: Arc<dyn ImageHost>,
        model: Arc<dyn VisionModel>,
        renderer: Arc<dyn PdfRenderer>,
    ) -> Result<Self> {
        let analyzer = Analyzer::new(model, &settings.analysis);
        let pdf = PdfService::new(renderer, settings.pdf.filename.clone())?;

        Ok(Self {
            settings: Arc::new(settings),
            image_host,
            analyzer,
            prompt: PromptBuilder::new()?,
            pdf,
        })
    }
}
