//! Backend module - Image hosts, vision model and PDF renderers

pub mod chromium;
pub mod cloudinary;
pub mod gotenberg;
pub mod inline;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::{ImageHostConfig, ImageHostProvider, PdfConfig, PdfRendererKind};
use crate::error::Result;
use traits::{ImageHost, PdfRenderer};

/// Build the configured image host
pub fn image_host_from_config(config: &ImageHostConfig) -> Result<Arc<dyn ImageHost>> {
    Ok(match config.provider {
        ImageHostProvider::Cloudinary => Arc::new(cloudinary::CloudinaryHost::new(config)?),
        ImageHostProvider::Inline => Arc::new(inline::InlineHost::new()),
    })
}

/// Build the configured PDF renderer
pub fn pdf_renderer_from_config(config: &PdfConfig) -> Result<Arc<dyn PdfRenderer>> {
    Ok(match config.renderer {
        PdfRendererKind::Gotenberg => Arc::new(gotenberg::GotenbergRenderer::new(config)?),
        PdfRendererKind::Chromium => Arc::new(chromium::ChromiumRenderer::new(config)),
    })
}
