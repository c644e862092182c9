//! Report module - Prompt, post-processing, insights and the retry loop

pub mod analyzer;
pub mod insights;
pub mod postprocess;
pub mod prompt;
pub mod sections;

use serde::Serialize;

pub use insights::Insight;

/// Post-processed model answer
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Full report HTML
    pub html: String,
    /// Intro plus the first few category sections
    pub preview_html: String,
    pub insights: Vec<Insight>,
    pub top_concerns: Vec<String>,
    /// First two AM routine steps
    pub am_preview: Vec<String>,
}

impl Report {
    /// Build a report from raw model output
    pub fn from_model_output(raw: &str, preview_sections: usize) -> Self {
        let (body, block) = insights::split_block(raw);
        let html = postprocess::postprocess(&body);
        let insights = insights::extract(block.as_deref(), &html);

        Self {
            preview_html: sections::preview_html(&html, preview_sections),
            top_concerns: sections::top_concerns(&html),
            am_preview: sections::am_routine_preview(&html),
            insights,
            html,
        }
    }
}
