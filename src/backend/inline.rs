//! Data URL "host" that keeps the image inside the model request

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::backend::traits::{HostedImage, ImageHost};
use crate::error::Result;
use crate::upload::UploadedImage;

/// Image host that never leaves the process
#[derive(Debug, Default)]
pub struct InlineHost;

impl InlineHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageHost for InlineHost {
    fn name(&self) -> &str {
        "inline"
    }

    async fn upload(&self, image: &UploadedImage) -> Result<HostedImage> {
        Ok(HostedImage {
            url: create_data_url(&image.bytes, image.format()),
            public_id: None,
        })
    }
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], format: &str) -> String {
    format!("data:image/{};base64,{}", format, STANDARD.encode(data))
}
