//! Regex clean-up of the model's HTML
//!
//! Every step leaves its own output unchanged, so `postprocess` can be run
//! on an already processed report.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::report::sections::find_labelled_item;

static OPENING_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^[ \t]*```(?:html)?[ \t]*\r?\n?").unwrap());
static CLOSING_FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)```[ \t]*$").unwrap());
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|\z)").unwrap());
static EMBEDDED_DOCUMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<(?:iframe|object|frameset|frame)\b[^>]*>.*?(?:</(?:iframe|object|frameset|frame)\s*>|\z)",
    )
    .unwrap()
});
static LOADER_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:embed|link|meta|base|iframe|object|frame|frameset)\b[^>]*>").unwrap());
static OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z][^>]*>").unwrap());
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});
static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<li><strong>Score:</strong>\s*([0-5])/5</li>").unwrap());

const ROUTINE_BOX_CLASS: &str = "routine-box";

/// Colour of each routine box
const ROUTINES: [(&str, &str); 2] = [("AM Routine", "#e3f2fd"), ("PM Routine", "#fce4ec")];

/// Full clean-up pipeline applied to every model answer
pub fn postprocess(raw: &str) -> String {
    let html = strip_code_fences(raw);
    let html = sanitize(&html);
    let html = apply_score_stars(&html);
    apply_routine_box(&html).trim().to_string()
}

/// Drop markdown fences the model wraps around HTML despite being told not to
pub fn strip_code_fences(html: &str) -> String {
    let html = OPENING_FENCE_RE.replace_all(html, "");
    CLOSING_FENCE_RE.replace_all(&html, "").trim().to_string()
}

/// Remove any script the model emitted; the report is rendered as raw HTML.
/// Repeats until nothing matches, so removals cannot splice a new tag together.
pub fn strip_scripts(html: &str) -> String {
    until_stable(html, |html| SCRIPT_RE.replace_all(html, "").into_owned())
}

/// Scripts, embedded documents, resource-loading tags and `on*` handlers removed.
/// Applied to every report before it is shown or rendered to PDF.
pub fn sanitize(html: &str) -> String {
    until_stable(html, |html| {
        let html = SCRIPT_RE.replace_all(html, "");
        let html = EMBEDDED_DOCUMENT_RE.replace_all(&html, "");
        let html = LOADER_TAG_RE.replace_all(&html, "");
        OPEN_TAG_RE
            .replace_all(&html, |caps: &Captures| EVENT_ATTR_RE.replace_all(&caps[0], "").into_owned())
            .into_owned()
    })
}

fn until_stable(html: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = html.to_string();
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// `Score: 3/5` becomes `Score: 3/5 &nbsp; ⭐️⭐️⭐️☆☆`
pub fn apply_score_stars(html: &str) -> String {
    SCORE_RE
        .replace_all(html, |caps: &Captures| {
            let score: usize = caps[1].parse().unwrap_or(0);
            let stars = format!("{}{}", "⭐️".repeat(score), "☆".repeat(5 - score));
            format!("<li><strong>Score:</strong> {}/5 &nbsp; {}</li>", score, stars)
        })
        .into_owned()
}

/// Wrap the first AM and PM routine items in coloured boxes
pub fn apply_routine_box(html: &str) -> String {
    ROUTINES
        .iter()
        .fold(html.to_string(), |html, (label, colour)| wrap_routine(&html, label, colour))
}

fn wrap_routine(html: &str, label: &str, colour: &str) -> String {
    let Some((start, content_start, end)) = find_labelled_item(html, label) else {
        return html.to_string();
    };

    let content = html[content_start..end].trim();
    if content.starts_with(&format!("<div class=\"{}", ROUTINE_BOX_CLASS)) {
        return html.to_string();
    }

    format!(
        "{}<li><strong>{}:</strong><div class=\"{}\" style=\"background:{}; border-radius:8px; padding:12px; margin-top:6px;\">{}</div></li>{}",
        &html[..start],
        label,
        ROUTINE_BOX_CLASS,
        colour,
        content,
        &html[end + "</li>".len()..]
    )
}
