//! Best-effort reading of the report HTML structure

use once_cell::sync::Lazy;
use regex::Regex;

static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HEADING_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\p{L}\p{N}]*(?:\d+\s*[.)]\s*)?").unwrap());
static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-5])\s*/\s*5\b").unwrap());
static TOP_CONCERNS_BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Top 3 Concerns:\s*<li><strong>(.*?)</strong></li>").unwrap());
static TOP_CONCERNS_PLAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Top 3 Concerns:\s*(.*?)</li>").unwrap());
static CONCERN_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>|</li>|,|\n").unwrap());
static LIST_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());
static LABELLED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li>\s*<strong>\s*([^<]*?)\s*:?\s*</strong>\s*:?\s*").unwrap());
static ROUTINE_STEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").unwrap());
static ROUTINE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>|→|;|\n").unwrap());

/// One `<h2>` heading and everything up to the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    /// Heading text without tags, emoji or numbering
    pub title: String,
    pub body: &'a str,
}

impl Section<'_> {
    /// Whether this is the closing summary rather than a skin category
    pub fn is_summary(&self) -> bool {
        self.title.to_lowercase().contains("summary")
    }

    /// Text of the `<li><strong>{label}:</strong> ...</li>` item
    pub fn field(&self, label: &str) -> Option<String> {
        let content = list_item_content(self.body, label)?;
        let text = strip_tags(content);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Score out of five, when the section has one
    pub fn score(&self) -> Option<u8> {
        let content = list_item_content(self.body, "Score")?;
        SCORE_RE
            .captures(content)
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// Split the report into its `<h2>` sections
pub fn sections(html: &str) -> Vec<Section<'_>> {
    let headings: Vec<_> = H2_RE.captures_iter(html).collect();

    headings
        .iter()
        .enumerate()
        .map(|(index, caps)| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let end = headings
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());
            let title = strip_tags(&caps[1]);

            Section {
                title: HEADING_PREFIX_RE.replace(&title, "").trim().to_string(),
                body: &html[whole.end..end],
            }
        })
        .collect()
}

/// Number of skin category sections (summary excluded)
pub fn category_count(html: &str) -> usize {
    sections(html).iter().filter(|s| !s.is_summary()).count()
}

/// Remove tags, decode the few entities the model uses and collapse whitespace
pub fn strip_tags(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Everything before the `(sections + 1)`-th `<h2`, i.e. the intro plus the first sections
pub fn preview_html(html: &str, sections: usize) -> String {
    let cut = H2_RE
        .find_iter(html)
        .nth(sections)
        .map_or(html.len(), |m| m.start());
    html[..cut].trim_end().to_string()
}

/// Items of the "Top 3 Concerns" summary line
pub fn top_concerns(html: &str) -> Vec<String> {
    let raw = list_item_content(html, "Top 3 Concerns")
        .map(str::to_owned)
        .or_else(|| {
            TOP_CONCERNS_BOLD_RE
                .captures(html)
                .or_else(|| TOP_CONCERNS_PLAIN_RE.captures(html))
                .map(|caps| caps[1].to_string())
        });

    raw.map(|raw| split_concerns(&raw)).unwrap_or_default()
}

/// Split a concern list on line breaks, list items, commas and newlines
pub fn split_concerns(raw: &str) -> Vec<String> {
    CONCERN_SPLIT_RE
        .split(raw)
        .map(strip_tags)
        .map(|c| LIST_NUMBER_RE.replace(&c, "").into_owned())
        .filter(|c| !c.is_empty())
        .collect()
}

/// First two steps of the AM routine
pub fn am_routine_preview(html: &str) -> Vec<String> {
    let Some(content) = list_item_content(html, "AM Routine") else {
        return vec![];
    };

    let steps: Vec<String> = ROUTINE_STEP_RE
        .captures_iter(content)
        .map(|caps| strip_tags(&caps[1]))
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();

    if !steps.is_empty() {
        return steps;
    }

    ROUTINE_SPLIT_RE
        .split(&strip_tags(content))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(2)
        .collect()
}

/// Inner HTML of the first `<li>` that starts with `<strong>{label}:</strong>`,
/// label excluded. Nested lists are kept whole.
pub fn list_item_content<'a>(html: &'a str, label: &str) -> Option<&'a str> {
    let (_, content_start, end) = find_labelled_item(html, label)?;
    Some(&html[content_start..end])
}

/// Byte offsets of a labelled list item: (item start, content start, closing tag start)
pub(crate) fn find_labelled_item(html: &str, label: &str) -> Option<(usize, usize, usize)> {
    let caps = LABELLED_ITEM_RE
        .captures_iter(html)
        .find(|caps| caps[1].eq_ignore_ascii_case(label))?;
    let found = caps.get(0)?;
    let end = closing_li(html, found.end())?;
    Some((found.start(), found.end(), end))
}

/// Start of the `</li>` closing the item whose content begins at `from`
fn closing_li(html: &str, from: usize) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut depth = 0usize;
    let mut pos = from;

    while pos < bytes.len() {
        let rest = &bytes[pos..];
        if rest.starts_with(b"</li>") {
            if depth == 0 {
                return Some(pos);
            }
            depth -= 1;
            pos += 5;
        } else if rest.starts_with(b"<li")
            && matches!(bytes.get(pos + 3), Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n'))
        {
            depth += 1;
            pos += 3;
        } else {
            pos += 1;
        }
    }

    None
}
