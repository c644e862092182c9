//! Common traits and types for the external collaborators

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::upload::UploadedImage;

/// Image stored on a host the model can fetch from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedImage {
    /// Public URL of the image
    pub url: String,

    /// Host-side identifier, when the host assigns one
    pub public_id: Option<String>,
}

/// Trait for image hosting services
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Get the host name
    fn name(&self) -> &str;

    /// Upload an image and return where it can be fetched
    async fn upload(&self, image: &UploadedImage) -> Result<HostedImage>;
}

/// Request for one vision completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Instruction text sent alongside the image
    pub prompt: String,

    /// URL (or data URL) of the image to analyze
    pub image_url: String,
}

/// Response from a vision completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionResponse {
    /// Raw text content of the first choice
    pub content: String,

    /// Model that produced the answer
    pub model: Option<String>,

    /// Why generation stopped ("stop", "length", ...)
    pub finish_reason: Option<String>,
}

/// Trait for vision-capable chat models
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Get the model name
    fn name(&self) -> &str;

    /// Run one completion for a prompt and an image
    async fn complete(&self, request: VisionRequest) -> Result<VisionResponse>;
}

/// Trait for HTML to PDF converters
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Get the renderer name
    fn name(&self) -> &str;

    /// Render a complete HTML document into PDF bytes
    async fn render(&self, html: &str) -> Result<Bytes>;
}
