//! Local headless Chromium renderer

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::backend::traits::PdfRenderer;
use crate::config::PdfConfig;
use crate::error::{AppError, Result};

/// Renders PDFs with `chromium --headless --print-to-pdf`
///
/// The HTML must already be sanitized: it is opened from a temp file, so any
/// embedded document would be able to reach `file://` URLs.
pub struct ChromiumRenderer {
    binary: String,
    timeout: Duration,
    no_sandbox: bool,
}

impl ChromiumRenderer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            binary: config.chromium_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            no_sandbox: config.chromium_no_sandbox,
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-pdf-header-footer".to_string(),
            "--block-new-web-contents".to_string(),
        ];
        if self.no_sandbox {
            args.push("--no-sandbox".to_string());
        }
        args.push(format!("--print-to-pdf={}", output.display()));
        args.push(format!("file://{}", input.display()));
        args
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn render(&self, html: &str) -> Result<Bytes> {
        // Dropped (and removed) when this function returns
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("index.html");
        let output = workdir.path().join("report.pdf");

        fs::write(&input, html).await?;

        let mut command = Command::new(&self.binary);
        command.args(self.args(&input, &output)).kill_on_drop(true);

        debug!(binary = %self.binary, sandbox = !self.no_sandbox, "Launching headless Chromium");

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| AppError::Pdf(format!("Chromium timed out after {:?}", self.timeout)))?
            .map_err(|e| AppError::Pdf(format!("Failed to launch {}: {}", self.binary, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(status = %result.status, "Chromium exited with failure");
            return Err(AppError::Pdf(format!(
                "Chromium exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let pdf = fs::read(&output)
            .await
            .map_err(|e| AppError::Pdf(format!("Chromium produced no PDF: {}", e)))?;

        Ok(Bytes::from(pdf))
    }
}
