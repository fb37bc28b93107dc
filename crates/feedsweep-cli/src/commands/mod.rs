pub mod all;
pub mod cleanup;
pub mod filters;
pub mod save;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use feedsweep_core::{
    ai::TopicFilter,
    filter::{load_filters, FilterConfig, FilterSource},
    reader::ReaderClient,
    report::ConsoleReporter,
    run::{RunContext, RunOptions},
    AppConfig,
};

pub fn run_options(config: &AppConfig, dry_run: bool, updated_after: DateTime<Utc>) -> RunOptions {
    RunOptions {
        dry_run,
        updated_after: Some(updated_after),
        mutation_delay: config.reader.mutation_delay(),
    }
}

/// Everything a job needs, built once per invocation
pub struct Session {
    reader: ReaderClient,
    topic_filter: Option<TopicFilter>,
    filters: FilterConfig,
    reporter: ConsoleReporter,
}

impl Session {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let reporter = ConsoleReporter::new();

        let reader =
            ReaderClient::new(config).context("Reader API client not configured")?;

        let source = FilterSource::from_config(&config.filters);
        let filters = load_filters(&source, &reporter).await;

        let topic_filter = if filters.has_ai_filters() {
            TopicFilter::from_config(&config.ai)
        } else {
            None
        };

        Ok(Self {
            reader,
            topic_filter,
            filters,
            reporter,
        })
    }

    pub fn context(&self) -> RunContext<'_> {
        RunContext {
            reader: &self.reader,
            topic_filter: self.topic_filter.as_ref(),
            reporter: &self.reporter,
            filters: &self.filters,
        }
    }
}
