//! Configuration loading

pub mod settings;

pub use settings::{
    AnalysisConfig, ImageHostConfig, ImageHostProvider, LoggingConfig, ModelConfig, PdfConfig,
    PdfRendererKind, RateLimitConfig, ServerConfig, Settings,
};
