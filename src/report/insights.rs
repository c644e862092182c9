//! Insight records for the locked preview
//!
//! The model is asked to append a JSON block; when that block is missing or
//! beyond repair the insights are read from the category sections instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::report::sections::{sections, Section};

/// `id` of the script tag carrying the insights
pub const INSIGHTS_BLOCK_ID: &str = "glowup-insights";

/// Maximum number of insights handed to the client
pub const MAX_INSIGHTS: usize = 3;

static SCRIPT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*(?:application/json|glowup-insights)[^>]*>(.*?)(?:</script\s*>|\z)"#)
        .unwrap()
});
static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)(?:```|\z)").unwrap());
static TRAILING_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());
static INGREDIENT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[–—-]\s+").unwrap());

/// One concern shown in the preview cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Insight {
    pub category: String,
    pub status: String,
    pub solution: String,
    pub emotional_hook: String,
    pub product: String,
    pub reason: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<Insight>),
    Wrapped { insights: Vec<Insight> },
    Single(Insight),
}

impl Payload {
    fn into_vec(self) -> Vec<Insight> {
        match self {
            Payload::List(list) => list,
            Payload::Wrapped { insights } => insights,
            Payload::Single(insight) => vec![insight],
        }
    }
}

/// Split the model output into HTML and the raw insights block, if any
pub fn split_block(raw: &str) -> (String, Option<String>) {
    for re in [&*SCRIPT_BLOCK_RE, &*FENCED_BLOCK_RE] {
        if let Some(caps) = re.captures(raw) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let block = caps[1].trim().to_string();
            let html = format!("{}{}", &raw[..whole.start], &raw[whole.end..]);
            return (html, Some(block));
        }
    }

    (raw.to_string(), None)
}

/// Parse a JSON block, repairing the usual model mistakes first
pub fn parse_block(block: &str) -> Option<Vec<Insight>> {
    let normalized = normalize_json(block);

    let parsed = serde_json::from_str::<Payload>(&close_brackets(&normalized))
        .or_else(|_| serde_json::from_str::<Payload>(&truncate_to_last_object(&normalized)));

    match parsed {
        Ok(payload) => {
            let insights: Vec<Insight> = payload
                .into_vec()
                .into_iter()
                .filter(|i| !i.category.trim().is_empty())
                .take(MAX_INSIGHTS)
                .collect();
            if insights.is_empty() {
                None
            } else {
                Some(insights)
            }
        }
        Err(e) => {
            debug!(error = %e, "Insights block could not be repaired");
            None
        }
    }
}

/// Insights from the JSON block when usable, otherwise from the report sections
pub fn extract(block: Option<&str>, html: &str) -> Vec<Insight> {
    block
        .and_then(parse_block)
        .unwrap_or_else(|| from_sections(html))
}

/// Smart quotes and trailing commas
fn normalize_json(text: &str) -> String {
    let text = text
        .trim()
        .replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    TRAILING_COMMA_RE.replace_all(&text, "$1").into_owned()
}

/// Cut after the last complete object, then close what is still open
fn truncate_to_last_object(text: &str) -> String {
    match text.rfind('}') {
        Some(end) => {
            let cut = text[..=end].to_string();
            close_brackets(&cut)
        }
        None => text.to_string(),
    }
}

/// Append the closers missing at the end of a truncated document
fn close_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = text.trim_end().to_string();
    if in_string {
        out.push('"');
    }
    let trimmed_len = out.trim_end_matches([',', ' ', '\n', '\r', '\t']).len();
    out.truncate(trimmed_len);
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

/// The lowest-scoring categories, read straight from the report
pub fn from_sections(html: &str) -> Vec<Insight> {
    let mut scored: Vec<(u8, Insight)> = sections(html)
        .iter()
        .filter(|s| !s.is_summary())
        .map(|s| (s.score().unwrap_or(u8::MAX), section_insight(s)))
        .collect();

    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .map(|(_, insight)| insight)
        .take(MAX_INSIGHTS)
        .collect()
}

fn section_insight(section: &Section<'_>) -> Insight {
    let ingredient = section.field("Recommended Ingredient").unwrap_or_default();
    let parts: Vec<&str> = INGREDIENT_SPLIT_RE.split(&ingredient).collect();

    let (product, reason) = match parts.as_slice() {
        [] | [_] => (ingredient.clone(), String::new()),
        [name, why] => (name.to_string(), why.to_string()),
        [name, middle @ .., kind] => (format!("{} {}", name, kind), middle.join(" – ")),
    };

    Insight {
        category: section.title.clone(),
        status: section.field("Condition").unwrap_or_default(),
        solution: section.field("Improvement Strategy").unwrap_or_default(),
        emotional_hook: section.field("Medical Meaning").unwrap_or_default(),
        product,
        reason,
    }
}
