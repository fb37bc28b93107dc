use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use super::ReaderApi;
use crate::config::AppConfig;
use crate::document::{Document, Location};
use crate::retry::RetryPolicy;
use crate::{Error, Result};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Document>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    location: &'a str,
}

/// Readwise Reader v3 API client
///
/// Listing is a single best-effort pass over all pages; deletes and updates
/// are wrapped in the configured [`RetryPolicy`].
pub struct ReaderClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ReaderClient {
    /// Create a client from application configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_base_url(
            config.api_token()?,
            &config.reader.base_url,
            config.reader.request_timeout_secs,
            config.retry.policy(),
        )
    }

    pub fn with_base_url(
        token: &str,
        base_url: &str,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?.as_str().trim_end_matches('/').to_string();
        let client = Self::build_client(token, timeout_secs)?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    fn build_client(token: &str, timeout_secs: u64) -> Result<Client> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|e| Error::Config(format!("Invalid API token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("feedsweep/", env!("CARGO_PKG_VERSION"))),
        );

        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(Error::Http)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn a non-success response into `Error::Api`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.unwrap_or_default();
        let message = match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            None => body,
        };

        Err(Error::Api {
            status: status.as_u16(),
            message,
            retry_after,
        })
    }

    async fn list_page(
        &self,
        location: Option<Location>,
        updated_after: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<ListResponse> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(location) = location {
            query.push(("location", location.as_str()));
        }
        if let Some(updated_after) = updated_after {
            query.push(("updatedAfter", updated_after));
        }
        if let Some(cursor) = cursor {
            query.push(("pageCursor", cursor));
        }

        let response = self
            .client
            .get(self.endpoint("list/"))
            .query(&query)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("delete/{}/", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn send_update(&self, id: &str, location: Location) -> Result<()> {
        let response = self
            .client
            .patch(self.endpoint(&format!("update/{}/", id)))
            .json(&UpdateRequest {
                location: location.as_str(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReaderApi for ReaderClient {
    async fn list_documents(
        &self,
        location: Option<Location>,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Document>> {
        let updated_after = updated_after.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .list_page(location, updated_after.as_deref(), cursor.as_deref())
                .await?;
            documents.extend(page.results);

            match page.next_page_cursor.filter(|c| !c.is_empty()) {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    tracing::warn!("Reader API returned the same page cursor twice, stopping");
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!("Fetched {} documents from the Reader API", documents.len());
        Ok(documents)
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.retry
            .run(&format!("delete {}", id), || async move { self.send_delete(id).await })
            .await?;
        tracing::debug!("Deleted document {}", id);
        Ok(())
    }

    async fn update_location(&self, id: &str, location: Location) -> Result<()> {
        self.retry
            .run(&format!("update {}", id), || async move {
                self.send_update(id, location).await
            })
            .await?;
        tracing::debug!("Moved document {} to {}", id, location);
        Ok(())
    }
}
