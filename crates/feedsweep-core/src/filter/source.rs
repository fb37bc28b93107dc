use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;

use super::config::FilterConfig;
use crate::config::FiltersConfig;
use crate::report::Reporter;
use crate::{Error, Result};

const GIST_TIMEOUT_SECS: u64 = 30;
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Where to read the filter JSON from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    File(PathBuf),
    Gist {
        id: String,
        token: Option<String>,
        base_url: String,
    },
}

impl FilterSource {
    /// Gist when one is configured, otherwise the local file
    pub fn from_config(config: &FiltersConfig) -> Self {
        match config.gist_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => FilterSource::Gist {
                id: id.to_string(),
                token: config.github_token.clone(),
                base_url: config.github_base_url.clone(),
            },
            _ => FilterSource::File(config.path.clone()),
        }
    }
}

#[derive(Deserialize)]
struct GistResponse {
    files: BTreeMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
}

/// Load filters, falling back to an empty configuration on any failure
///
/// A missing file, malformed JSON or an unreachable gist never aborts the
/// run; the problem is reported as a warning and every list is empty.
pub async fn load_filters(source: &FilterSource, reporter: &dyn Reporter) -> FilterConfig {
    let loaded = match source {
        FilterSource::File(path) => load_from_file(path).map_err(|e| {
            format!("Failed to load filters from {}: {}", path.display(), e)
        }),
        FilterSource::Gist {
            id,
            token,
            base_url,
        } => load_from_gist(base_url, id, token.as_deref())
            .await
            .map_err(|e| format!("Failed to fetch filters from gist: {}", e)),
    };

    match loaded {
        Ok(filters) => filters,
        Err(message) => {
            reporter.warning(&message);
            FilterConfig::default()
        }
    }
}

fn load_from_file(path: &Path) -> Result<FilterConfig> {
    if !path.exists() {
        return Err(Error::Config("file not found".to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    FilterConfig::from_json(&content)
}

async fn load_from_gist(base_url: &str, id: &str, token: Option<&str>) -> Result<FilterConfig> {
    let client = Client::builder()
        .timeout(Duration::from_secs(GIST_TIMEOUT_SECS))
        .build()?;

    let url = format!("{}/gists/{}", base_url.trim_end_matches('/'), id);
    tracing::info!("Fetching filters from {}", url);

    let response = client.get(&url).headers(gist_headers(token)).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: format!("GitHub returned {} for gist {}", status, id),
            retry_after: None,
        });
    }

    let gist: GistResponse = response.json().await?;
    let content = gist
        .files
        .into_values()
        .next()
        .and_then(|f| f.content)
        .ok_or_else(|| Error::Config(format!("gist {} has no file content", id)))?;

    FilterConfig::from_json(&content)
}

fn gist_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(
        "x-github-api-version",
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("feedsweep/", env!("CARGO_PKG_VERSION"))),
    );
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}
