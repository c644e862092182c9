//! Cloudinary image host

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::traits::{HostedImage, ImageHost};
use crate::config::ImageHostConfig;
use crate::error::{AppError, Result};
use crate::upload::UploadedImage;

/// Signed uploads to the Cloudinary upload API
pub struct CloudinaryHost {
    client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    public_id: Option<String>,
}

impl CloudinaryHost {
    /// Create a new host client from configuration
    pub fn new(config: &ImageHostConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name)
    }

    /// Upload options that take part in the signature
    fn signed_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("folder", self.folder.clone());
        params.insert("overwrite", "false".to_string());
        params.insert("timestamp", timestamp.to_string());
        params.insert("unique_filename", "true".to_string());
        params.insert("use_filename", "false".to_string());
        params
    }
}

/// SHA-256 over `k1=v1&k2=v2...` (keys sorted) followed by the API secret
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("{:x}", Sha256::digest(format!("{}{}", joined, api_secret).as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, image: &UploadedImage) -> Result<HostedImage> {
        let params = self.signed_params(chrono::Utc::now().timestamp());
        let signature = sign_params(&params, &self.api_secret);

        let file_name = image
            .file_name
            .clone()
            .unwrap_or_else(|| format!("selfie.{}", image.format()));
        let file = Part::bytes(image.bytes.to_vec())
            .file_name(file_name)
            .mime_str(&image.content_type)?;

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(cloud = %self.cloud_name, size = image.bytes.len(), "Uploading image");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Cloudinary upload failed");
            return Err(AppError::ImageHost(format!(
                "Cloudinary returned {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageHost(format!("Failed to parse upload response: {}", e)))?;

        info!(url = %uploaded.secure_url, "Uploaded image");

        Ok(HostedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
