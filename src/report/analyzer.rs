//! Bounded "retry until the report looks complete" loop

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::traits::{VisionModel, VisionRequest};
use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::report::{sections, Report};

/// Substring and heading checks a report has to pass
#[derive(Debug, Clone)]
pub struct CompletenessCheck {
    pub required_markers: Vec<String>,
    pub min_categories: usize,
}

impl CompletenessCheck {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            required_markers: config.required_markers.clone(),
            min_categories: config.min_categories,
        }
    }

    /// `Err` carries the reason the report was judged incomplete
    pub fn check(&self, html: &str, finish_reason: Option<&str>) -> std::result::Result<(), String> {
        if html.trim().is_empty() {
            return Err("empty response".to_string());
        }

        if finish_reason == Some("length") {
            return Err("output truncated at max_tokens".to_string());
        }

        if let Some(missing) = self.required_markers.iter().find(|m| !html.contains(m.as_str())) {
            return Err(format!("missing section '{}'", missing));
        }

        let categories = sections::category_count(html);
        if categories < self.min_categories {
            return Err(format!(
                "only {} of {} categories present",
                categories, self.min_categories
            ));
        }

        Ok(())
    }
}

/// Runs the vision model until it produces a complete report
pub struct Analyzer {
    model: Arc<dyn VisionModel>,
    check: CompletenessCheck,
    max_attempts: u32,
    retry_delay: Duration,
    preview_sections: usize,
}

impl Analyzer {
    pub fn new(model: Arc<dyn VisionModel>, config: &AnalysisConfig) -> Self {
        Self {
            model,
            check: CompletenessCheck::from_config(config),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            preview_sections: config.preview_sections,
        }
    }

    /// Call the model at most `max_attempts` times
    pub async fn analyze(&self, request: VisionRequest) -> Result<Report> {
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts {
            match self.model.complete(request.clone()).await {
                Ok(response) => {
                    let report = Report::from_model_output(&response.content, self.preview_sections);

                    match self.check.check(&report.html, response.finish_reason.as_deref()) {
                        Ok(()) => {
                            info!(
                                model = %self.model.name(),
                                attempt = attempt,
                                insights = report.insights.len(),
                                "Report complete"
                            );
                            return Ok(report);
                        }
                        Err(reason) => {
                            warn!(
                                attempt = attempt,
                                max_attempts = self.max_attempts,
                                reason = %reason,
                                "Model output incomplete"
                            );
                            last_failure = reason;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Model call failed"
                    );
                    last_failure = e.to_string();
                }
            }

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(AppError::AnalysisFailed {
            attempts: self.max_attempts,
            reason: last_failure,
        })
    }
}
