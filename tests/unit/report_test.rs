//! Unit tests for report post-processing and insight extraction

use glowup_server::report::{
    insights::{self, MAX_INSIGHTS},
    postprocess::postprocess,
    prompt::{PromptBuilder, Subject, CATEGORIES},
    sections, Report,
};

const RAW: &str = r#"```html
<h1>🌿 Comprehensive Skin Report</h1>
<h2>🔹 1. Sebum (T-zone vs cheeks)</h2>
<ul>
  <li><strong>Score:</strong> 2/5</li>
  <li><strong>Condition:</strong> Oily T-zone, normal cheeks</li>
  <li><strong>Improvement Strategy:</strong> Lightweight gel moisturiser</li>
  <li><strong>Recommended Ingredient:</strong> Niacinamide – Regulates sebum – Serum</li>
</ul>
<h2>🔹 2. Hydration</h2>
<ul><li><strong>Score:</strong> 4/5</li></ul>
<h2>✨ Final Summary</h2>
<ul>
  <li><strong>Top 3 Concerns:</strong> Sebum<br/>Pores<br/>Redness</li>
  <li><strong>AM Routine:</strong> Gel cleanser → Niacinamide serum → SPF</li>
  <li><strong>PM Routine:</strong><ul><li>Oil cleanse</li><li>Retinal</li></ul></li>
  <li><strong>Closing Message:</strong> 화이팅!</li>
</ul>
```"#;

#[test]
fn test_postprocess_is_idempotent() {
    let once = postprocess(RAW);
    let twice = postprocess(&once);
    assert_eq!(once, twice);
    assert_eq!(once.matches("routine-box").count(), 2);
    assert_eq!(once.matches("⭐️⭐️☆☆☆").count(), 1);
}

#[test]
fn test_postprocess_leaves_clean_html_alone() {
    let clean = "<h1>Report</h1>\n<p>Nothing to fix here.</p>";
    assert_eq!(postprocess(clean), clean);
}

#[test]
fn test_report_without_block_uses_sections() {
    let report = Report::from_model_output(RAW, 1);

    assert_eq!(report.top_concerns, vec!["Sebum", "Pores", "Redness"]);
    assert_eq!(report.am_preview, vec!["Gel cleanser", "Niacinamide serum"]);
    assert!(report.preview_html.contains("Sebum"));
    assert!(!report.preview_html.contains("Hydration"));

    let categories: Vec<&str> = report.insights.iter().map(|i| i.category.as_str()).collect();
    assert_eq!(categories, vec!["Sebum (T-zone vs cheeks)", "Hydration"]);
    assert_eq!(report.insights[0].status, "Oily T-zone, normal cheeks");
    assert_eq!(report.insights[0].product, "Niacinamide Serum");
    assert_eq!(report.insights[0].reason, "Regulates sebum");
}

#[test]
fn test_wrapped_payload_is_accepted() {
    let block = r#"{"insights": [{"category": "Pores", "product": "BHA toner"}]}"#;
    let parsed = insights::parse_block(block).unwrap();
    assert_eq!(parsed[0].category, "Pores");
    assert_eq!(parsed[0].product, "BHA toner");
}

#[test]
fn test_unusable_block_falls_back_to_sections() {
    let html = postprocess(RAW);
    let extracted = insights::extract(Some("{{{"), &html);
    assert!(!extracted.is_empty());
    assert!(extracted.len() <= MAX_INSIGHTS);
    assert_eq!(extracted[0].category, "Sebum (T-zone vs cheeks)");
}

#[test]
fn test_category_count_ignores_summary() {
    assert_eq!(sections::category_count(&postprocess(RAW)), 2);
}

#[test]
fn test_prompt_lists_every_category() {
    let prompt = PromptBuilder::new()
        .unwrap()
        .render(&Subject::default())
        .unwrap();

    for category in CATEGORIES {
        assert!(prompt.contains(category), "missing {category}");
    }
    assert!(prompt.contains(insights::INSIGHTS_BLOCK_ID));
    assert!(prompt.contains("Closing Message"));
}
