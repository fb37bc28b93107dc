use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Filter lists fetched fresh on every run
///
/// Every list defaults to empty, and an empty list never matches anything.
/// Older filter files used `*_contains` keys; those are merged into the
/// matching `*_exclude` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilterConfig")]
pub struct FilterConfig {
    pub title_exclude: Vec<String>,
    pub summary_exclude: Vec<String>,
    pub url_exclude: Vec<String>,
    pub author_exclude: Vec<String>,
    pub ai_topic_exclude: Vec<String>,
    pub author_save_inbox: Vec<String>,
    pub author_save_later: Vec<String>,
}

/// Filter JSON as written, legacy keys included
#[derive(Deserialize)]
struct RawFilterConfig {
    #[serde(default, deserialize_with = "nullable_list")]
    title_exclude: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    title_contains: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    summary_exclude: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    summary_contains: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    url_exclude: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    url_contains: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    author_exclude: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    ai_topic_exclude: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    author_save_inbox: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    author_save_later: Vec<String>,
}

impl From<RawFilterConfig> for FilterConfig {
    fn from(raw: RawFilterConfig) -> Self {
        fn merged(mut current: Vec<String>, legacy: Vec<String>) -> Vec<String> {
            current.extend(legacy);
            current
        }

        Self {
            title_exclude: merged(raw.title_exclude, raw.title_contains),
            summary_exclude: merged(raw.summary_exclude, raw.summary_contains),
            url_exclude: merged(raw.url_exclude, raw.url_contains),
            author_exclude: raw.author_exclude,
            ai_topic_exclude: raw.ai_topic_exclude,
            author_save_inbox: raw.author_save_inbox,
            author_save_later: raw.author_save_later,
        }
    }
}

fn nullable_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Drop blank patterns and repeats (first occurrence wins)
///
/// Non-blank patterns are kept verbatim; surrounding spaces are part of the
/// substring being matched.
fn normalize_list(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    list.retain(|p| !p.trim().is_empty() && seen.insert(p.clone()));
}

impl FilterConfig {
    /// Parse filter JSON and normalize it
    ///
    /// The document must be a JSON object; unknown keys are ignored.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if !value.is_object() {
            return Err(Error::Config(
                "filter configuration must be a JSON object".to_string(),
            ));
        }
        let mut config: FilterConfig = serde_json::from_value(value)?;
        config.normalize();
        Ok(config)
    }

    /// Normalize every list in place
    ///
    /// A blank pattern would be a substring of every text, so it is removed
    /// here rather than at match time.
    pub fn normalize(&mut self) {
        for list in [
            &mut self.title_exclude,
            &mut self.summary_exclude,
            &mut self.url_exclude,
            &mut self.author_exclude,
            &mut self.ai_topic_exclude,
            &mut self.author_save_inbox,
            &mut self.author_save_later,
        ] {
            normalize_list(list);
        }
    }

    pub fn has_standard_filters(&self) -> bool {
        !(self.title_exclude.is_empty()
            && self.summary_exclude.is_empty()
            && self.url_exclude.is_empty()
            && self.author_exclude.is_empty())
    }

    pub fn has_ai_filters(&self) -> bool {
        !self.ai_topic_exclude.is_empty()
    }

    pub fn has_cleanup_filters(&self) -> bool {
        self.has_standard_filters() || self.has_ai_filters()
    }

    pub fn has_save_filters(&self) -> bool {
        !(self.author_save_inbox.is_empty() && self.author_save_later.is_empty())
    }
}
