//! Prompt templates layered on [`LlmClient::generate`].

use super::client::LlmClient;
use super::error::LlmError;
use super::types::GenerationRequest;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_TOPIC: &str = "AI and automation trends";
pub const DEFAULT_TONE: &str = "engaging";

/// Inputs for [`generate_social_post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPostContext {
    pub topic: Option<String>,
    pub platform: Platform,
    pub tone: Option<String>,
    #[serde(alias = "includeHashtags")]
    pub include_hashtags: bool,
}

impl Default for SocialPostContext {
    fn default() -> Self {
        Self {
            topic: None,
            platform: Platform::Twitter,
            tone: None,
            include_hashtags: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
        }
    }

    fn guideline(&self) -> &'static str {
        match self {
            Platform::Twitter => "Keep it under 280 characters. Be concise and engaging.",
            Platform::Linkedin => {
                "Professional tone, can be longer (up to 3000 chars). Focus on insights and value."
            }
        }
    }

    fn formatting(&self) -> &'static str {
        match self {
            Platform::Twitter => "Use line breaks for readability",
            Platform::Linkedin => "Use professional formatting",
        }
    }

    /// Short-form platforms get a small token budget.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Platform::Twitter => 100,
            Platform::Linkedin => 500,
        }
    }
}

/// Render the social post prompt.
pub fn social_post_prompt(context: &SocialPostContext) -> String {
    let topic = context.topic.as_deref().unwrap_or(DEFAULT_TOPIC);
    let tone = context.tone.as_deref().unwrap_or(DEFAULT_TONE);
    let hashtags = if context.include_hashtags {
        "Include 2-3 relevant hashtags"
    } else {
        "No hashtags"
    };

    format!(
        "Generate a {tone} social media post for {platform}.\n\n\
         Topic: {topic}\n\n\
         Guidelines:\n\
         - {guideline}\n\
         - {hashtags}\n\
         - Make it authentic and valuable\n\
         - {formatting}\n\n\
         Generate only the post content, nothing else.",
        platform = context.platform.as_str(),
        guideline = context.platform.guideline(),
        formatting = context.platform.formatting(),
    )
}

/// Generate a ready-to-publish post; the returned text is trimmed.
pub async fn generate_social_post(
    client: &LlmClient,
    context: &SocialPostContext,
) -> Result<String, LlmError> {
    let request = GenerationRequest::new(social_post_prompt(context))
        .with_max_tokens(context.platform.max_tokens())
        .with_temperature(0.8)
        .with_platform(context.platform.as_str());

    let result = client.generate(&request).await?;
    Ok(result.content.trim().to_string())
}

pub fn content_ideas_prompt(count: usize) -> String {
    format!(
        "Generate {count} engaging social media post ideas about AI, automation, and technology trends.\n\n\
         Make them specific, actionable, and interesting. Format as a simple numbered list.\n\n\
         Examples:\n\
         1. How AI is transforming customer service automation\n\
         2. The rise of local AI models and what it means for privacy\n\
         3. Comparing different LLM providers for business use\n\n\
         Generate {count} new ideas:"
    )
}

/// Ask for `count` numbered ideas. A reply with fewer well-formed lines
/// yields a shorter list.
pub async fn generate_content_ideas(
    client: &LlmClient,
    count: usize,
) -> Result<Vec<String>, LlmError> {
    if count == 0 {
        return Err(LlmError::InvalidRequest("count must be positive".to_string()));
    }

    let request = GenerationRequest::new(content_ideas_prompt(count))
        .with_max_tokens(500)
        .with_temperature(0.9);

    let result = client.generate(&request).await?;
    Ok(parse_numbered_lines(&result.content))
}

/// Keep lines of the form `N. text`, returning `text` trimmed.
pub fn parse_numbered_lines(text: &str) -> Vec<String> {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    let re = NUMBERED.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

    text.lines()
        .map(str::trim)
        .filter_map(|line| {
            let m = re.find(line)?;
            let idea = line[m.end()..].trim();
            (!idea.is_empty()).then(|| idea.to_string())
        })
        .collect()
}
