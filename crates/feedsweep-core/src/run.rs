//! Shared pieces of the cleanup and save jobs

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::ai::TopicFilter;
use crate::document::{Document, Location};
use crate::filter::FilterConfig;
use crate::reader::ReaderApi;
use crate::report::Reporter;

/// Collaborators a job runs against
pub struct RunContext<'a> {
    pub reader: &'a dyn ReaderApi,
    pub topic_filter: Option<&'a TopicFilter>,
    pub reporter: &'a dyn Reporter,
    pub filters: &'a FilterConfig,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub updated_after: Option<DateTime<Utc>>,
    /// Pause between successive mutation calls
    pub mutation_delay: Duration,
}

/// Why a job stopped before mutating anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NothingToDo {
    NoFilters,
    NoDocuments,
    NoMatches,
}

/// Fetch the feed for the configured window, reporting failures
pub(crate) async fn fetch_feed(
    ctx: &RunContext<'_>,
    options: &RunOptions,
) -> std::result::Result<Vec<Document>, String> {
    match options.updated_after {
        Some(cutoff) => ctx.reporter.info(&format!(
            "Fetching feed documents updated after {}",
            cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
        )),
        None => ctx.reporter.info("Fetching all feed documents"),
    }

    match ctx
        .reader
        .list_documents(Some(Location::Feed), options.updated_after)
        .await
    {
        Ok(documents) => {
            ctx.reporter
                .info(&format!("Found {} documents in feed", documents.len()));
            Ok(documents)
        }
        Err(e) => {
            let message = e.to_string();
            ctx.reporter
                .error(&format!("Failed to fetch documents: {}", message));
            Err(message)
        }
    }
}

/// Sleep before every mutation except the first
pub(crate) async fn pace(index: usize, delay: Duration) {
    if index > 0 && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
