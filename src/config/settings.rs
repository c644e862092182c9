//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_request_timeout(),
            cors_allowed_origins: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Where uploaded selfies are hosted before being shown to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageHostProvider {
    Cloudinary,
    /// Embed the image as a data URL instead of hosting it
    Inline,
}

/// Image host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageHostConfig {
    #[serde(default = "default_image_provider")]
    pub provider: ImageHostProvider,
    #[serde(default = "default_cloudinary_url")]
    pub base_url: String,
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_ms: u64,
}

fn default_image_provider() -> ImageHostProvider {
    ImageHostProvider::Cloudinary
}

fn default_cloudinary_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_folder() -> String {
    "glowup-ai".to_string()
}

fn default_upload_timeout() -> u64 {
    30000
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            provider: default_image_provider(),
            base_url: default_cloudinary_url(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            timeout_ms: default_upload_timeout(),
        }
    }
}

/// Vision model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_model_timeout")]
    pub timeout_ms: u64,
}

fn default_model_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_model_timeout() -> u64 {
    120000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_url(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_model_timeout(),
        }
    }
}

/// Retry and completeness settings for report generation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Substrings every complete report must contain
    #[serde(default = "default_required_markers")]
    pub required_markers: Vec<String>,
    /// Minimum number of `<h2>` sections in a complete report
    #[serde(default = "default_min_categories")]
    pub min_categories: usize,
    /// Number of category sections left visible in the preview
    #[serde(default = "default_preview_sections")]
    pub preview_sections: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

fn default_required_markers() -> Vec<String> {
    vec!["Final Summary".to_string(), "Closing Message".to_string()]
}

fn default_min_categories() -> usize {
    9
}

fn default_preview_sections() -> usize {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
            required_markers: default_required_markers(),
            min_categories: default_min_categories(),
            preview_sections: default_preview_sections(),
        }
    }
}

/// How report HTML is turned into a PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfRendererKind {
    /// Remote Gotenberg instance
    Gotenberg,
    /// Local headless Chromium binary
    Chromium,
}

/// PDF rendering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_renderer")]
    pub renderer: PdfRendererKind,
    #[serde(default = "default_pdf_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chromium_path")]
    pub chromium_path: String,
    /// Pass `--no-sandbox`; only for containers that cannot provide one
    #[serde(default)]
    pub chromium_no_sandbox: bool,
    #[serde(default = "default_pdf_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_pdf_filename")]
    pub filename: String,
}

fn default_pdf_renderer() -> PdfRendererKind {
    PdfRendererKind::Gotenberg
}

fn default_pdf_endpoint() -> String {
    "http://localhost:3000".to_string()
}

fn default_chromium_path() -> String {
    "chromium".to_string()
}

fn default_pdf_timeout() -> u64 {
    60000
}

fn default_pdf_filename() -> String {
    "glowup_report.pdf".to_string()
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            renderer: default_pdf_renderer(),
            endpoint: default_pdf_endpoint(),
            chromium_path: default_chromium_path(),
            chromium_no_sandbox: false,
            timeout_ms: default_pdf_timeout(),
            filename: default_pdf_filename(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        let path = env::var("GLOWUP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Load from configuration file
            .add_source(File::from(path.as_ref()).required(false))
            // Override with environment variables (prefixed with GLOWUP__)
            .add_source(
                Environment::with_prefix("GLOWUP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("analysis.required_markers")
                    .with_list_parse_key("server.cors_allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_legacy_env();
        Ok(settings)
    }

    /// Fill unset credentials from the plain variable names used by older deployments
    fn apply_legacy_env(&mut self) {
        fill_from_env(&mut self.model.api_key, "OPENAI_API_KEY");
        fill_from_env(&mut self.image_host.cloud_name, "CLOUDINARY_CLOUD_NAME");
        fill_from_env(&mut self.image_host.api_key, "CLOUDINARY_API_KEY");
        fill_from_env(&mut self.image_host.api_secret, "CLOUDINARY_API_SECRET");

        // PORT only replaces the built-in default, never an explicit setting
        if self.server.port == default_port() {
            if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
                self.server.port = port;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        if self.analysis.max_attempts == 0 {
            return Err(config_error("analysis.max_attempts must be at least 1"));
        }

        if self.model.api_key.is_empty() {
            return Err(config_error(
                "Model API key is missing (set model.api_key or OPENAI_API_KEY)",
            ));
        }

        if self.image_host.provider == ImageHostProvider::Cloudinary {
            let host = &self.image_host;
            if host.cloud_name.is_empty() || host.api_key.is_empty() || host.api_secret.is_empty() {
                return Err(config_error(
                    "Cloudinary provider requires cloud_name, api_key and api_secret",
                ));
            }
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err(config_error(&format!(
                "Invalid logging format '{}'. Must be 'json' or 'pretty'",
                self.logging.format
            )));
        }

        Ok(())
    }
}

fn fill_from_env(slot: &mut String, key: &str) {
    if slot.is_empty() {
        if let Ok(value) = env::var(key) {
            *slot = value;
        }
    }
}

fn config_error(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
