//! Dermatologist prompt construction

use minijinja::{context, Environment};

use crate::error::Result;
use crate::report::insights::INSIGHTS_BLOCK_ID;

const PROMPT_TEMPLATE_NAME: &str = "analysis_prompt.txt";
const PROMPT_TEMPLATE: &str = include_str!("../../templates/analysis_prompt.txt");

/// The fixed report categories, in the order the model must return them
pub const CATEGORIES: [&str; 9] = [
    "Sebum (T-zone vs cheeks)",
    "Hydration",
    "Texture",
    "Pores",
    "Pigmentation",
    "Redness & Sensitivity",
    "Wrinkles & Elasticity",
    "Acne & Blemishes",
    "Dark Circles",
];

const MAX_NAME_CHARS: usize = 40;

/// Who the report is written for
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub name: Option<String>,
    pub age: Option<u8>,
}

/// Renders the analysis prompt
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_template(PROMPT_TEMPLATE_NAME, PROMPT_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the prompt for one subject
    pub fn render(&self, subject: &Subject) -> Result<String> {
        let name = subject.name.as_deref().map(clean_name).filter(|n| !n.is_empty());

        let prompt = self.env.get_template(PROMPT_TEMPLATE_NAME)?.render(context! {
            name => name,
            age => subject.age,
            categories => CATEGORIES,
            max_total => CATEGORIES.len() * 5,
            insights_id => INSIGHTS_BLOCK_ID,
        })?;

        Ok(prompt)
    }
}

/// Keep names short and free of markup before they reach the prompt
fn clean_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | '`'))
        .take(MAX_NAME_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}
