use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::providers::{build_provider, TokenUsage, TopicProvider};
use crate::config::AiConfig;
use crate::document::Document;

/// Per-document cap on text sent to the classifier
const MAX_TEXT_CHARS: usize = 1500;
/// Candidates are split into requests of roughly this many characters
const BATCH_CHAR_LIMIT: usize = 60_000;
const RESPONSE_KEY: &str = "matching_ids";

const SYSTEM_PROMPT: &str = "\
You filter documents for a reading list.
You receive a list of documents, each with an \"id\" and a \"text\", and a list of exclusion topics.
Exclusion topics are loose natural-language descriptions of what to filter out. They may be specific \
(\"articles about video games other than Nintendo Switch\") or broad (\"artiklar om teater\"), and may be \
written in any language.
A document matches when its main subject is, is closely related to, or is a clear example of any \
exclusion topic. Judge meaning, not shared keywords.
Respond with a JSON object with a single key \"matching_ids\" whose value is the list of matching \
document ids, as strings. Include only ids from the input. If nothing matches, return an empty list. \
Do not add any explanation.";

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Document field sent to the classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicTextField {
    #[default]
    Summary,
    Title,
}

impl TopicTextField {
    fn extract<'a>(&self, doc: &'a Document) -> &'a str {
        match self {
            TopicTextField::Summary => doc.summary(),
            TopicTextField::Title => doc.title(),
        }
    }
}

/// Minimal projection of a document for the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCandidate {
    pub id: String,
    pub text: String,
}

/// Why the classifier was not consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTopics,
    NoDocuments,
    /// No document had both an id and the configured text field
    NoEligibleDocuments,
    /// No provider is configured or available
    Disabled,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopicFilterError {
    #[error("classifier returned an empty response")]
    EmptyResponse,
    #[error("failed to decode JSON from classifier response: {0}")]
    InvalidJson(String),
    #[error("unexpected classifier response shape: {0}")]
    InvalidShape(String),
    #[error("classifier request failed: {0}")]
    Provider(String),
}

/// Result of one topic filtering pass
///
/// Never an error: failures are carried as `Failed` and contribute no ids.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicOutcome {
    Skipped(SkipReason),
    Matched {
        ids: HashSet<String>,
        usage: Option<TokenUsage>,
    },
    Failed(TopicFilterError),
}

/// Price table used to turn token usage into a cost estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Semantic exclusion filter backed by a chat model
pub struct TopicFilter {
    provider: Arc<dyn TopicProvider>,
    text_field: TopicTextField,
    pricing: Option<Pricing>,
}

impl TopicFilter {
    pub fn new(provider: Arc<dyn TopicProvider>) -> Self {
        Self {
            provider,
            text_field: TopicTextField::default(),
            pricing: None,
        }
    }

    /// Topic filter for the configured provider, if one is available
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let provider = build_provider(config)?;
        Some(
            Self::new(provider)
                .with_text_field(config.text_field)
                .with_pricing(Pricing {
                    input_per_million: config.input_cost_per_million,
                    output_per_million: config.output_cost_per_million,
                }),
        )
    }

    pub fn with_text_field(mut self, text_field: TopicTextField) -> Self {
        self.text_field = text_field;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    /// Estimated USD cost for `usage`, when prices are known
    pub fn estimate_cost(&self, usage: &TokenUsage) -> Option<f64> {
        self.pricing
            .map(|p| usage.cost(p.input_per_million, p.output_per_million))
    }

    /// Documents that can be sent: non-empty id and non-empty text
    pub fn project(&self, documents: &[Document]) -> Vec<TopicCandidate> {
        documents
            .iter()
            .filter_map(|doc| {
                let id = doc.id()?;
                let text = self.text_field.extract(doc).trim();
                if text.is_empty() {
                    return None;
                }
                Some(TopicCandidate {
                    id: id.to_string(),
                    text: truncate_chars(text, MAX_TEXT_CHARS).to_string(),
                })
            })
            .collect()
    }

    /// Ids of documents whose main subject matches any exclusion topic
    ///
    /// Fails open: provider errors and malformed replies come back as
    /// `Failed`, never as an error or a panic.
    pub async fn filter_by_topic(&self, documents: &[Document], topics: &[String]) -> TopicOutcome {
        if topics.is_empty() {
            return TopicOutcome::Skipped(SkipReason::NoTopics);
        }
        if documents.is_empty() {
            return TopicOutcome::Skipped(SkipReason::NoDocuments);
        }

        let candidates = self.project(documents);
        if candidates.is_empty() {
            return TopicOutcome::Skipped(SkipReason::NoEligibleDocuments);
        }

        let mut ids = HashSet::new();
        let mut usage: Option<TokenUsage> = None;

        for batch in batch_candidates(&candidates, BATCH_CHAR_LIMIT) {
            let user = match build_user_prompt(batch, topics) {
                Ok(prompt) => prompt,
                Err(e) => return TopicOutcome::Failed(TopicFilterError::Provider(e.to_string())),
            };

            tracing::debug!(
                provider = self.provider.name(),
                documents = batch.len(),
                topics = topics.len(),
                "Requesting topic classification"
            );

            let completion = match self.provider.complete_json(SYSTEM_PROMPT, &user).await {
                Ok(completion) => completion,
                Err(e) => return TopicOutcome::Failed(TopicFilterError::Provider(e.to_string())),
            };

            if let Some(batch_usage) = completion.usage {
                usage.get_or_insert_with(TokenUsage::default).add(batch_usage);
            }

            match parse_response(completion.content.as_deref()) {
                Ok(batch_ids) => ids.extend(batch_ids),
                Err(e) => return TopicOutcome::Failed(e),
            }
        }

        tracing::debug!("AI topic filter matched {} documents", ids.len());
        TopicOutcome::Matched { ids, usage }
    }
}

/// Split candidates into consecutive runs that fit `char_limit`
///
/// A single oversized candidate still gets its own batch.
fn batch_candidates(candidates: &[TopicCandidate], char_limit: usize) -> Vec<&[TopicCandidate]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut size = 0;

    for (i, candidate) in candidates.iter().enumerate() {
        let len = candidate.id.len() + candidate.text.len();
        if i > start && size + len > char_limit {
            batches.push(&candidates[start..i]);
            start = i;
            size = 0;
        }
        size += len;
    }
    if start < candidates.len() {
        batches.push(&candidates[start..]);
    }
    batches
}

fn build_user_prompt(
    candidates: &[TopicCandidate],
    topics: &[String],
) -> serde_json::Result<String> {
    Ok(format!(
        "Exclusion topics: {}\n\nDocuments: {}\n\n\
Identify which documents should be excluded based on the exclusion topics.",
        serde_json::to_string(topics)?,
        serde_json::to_string(candidates)?
    ))
}

/// Strip a surrounding markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

/// Validate a classifier reply of the form `{"matching_ids": ["id", ...]}`
///
/// A missing key means no matches; any other shape is an error.
pub fn parse_response(content: Option<&str>) -> Result<HashSet<String>, TopicFilterError> {
    let content = content
        .map(strip_code_fence)
        .filter(|c| !c.is_empty())
        .ok_or(TopicFilterError::EmptyResponse)?;

    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| TopicFilterError::InvalidJson(format!("{}: {}", e, content)))?;
    let Some(object) = value.as_object() else {
        return Err(TopicFilterError::InvalidShape(
            "expected a JSON object".to_string(),
        ));
    };

    let Some(raw) = object.get(RESPONSE_KEY) else {
        return Ok(HashSet::new());
    };
    let ids: Vec<String> = serde_json::from_value(raw.clone()).map_err(|_| {
        TopicFilterError::InvalidShape(format!("'{}' is not a list of strings", RESPONSE_KEY))
    })?;

    Ok(ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}
