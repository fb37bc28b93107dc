//! Delete feed documents that match the exclusion filters

use std::collections::HashSet;

use crate::ai::{SkipReason, TopicOutcome};
use crate::document::Document;
use crate::filter::filter_documents;
use crate::run::{fetch_feed, pace, NothingToDo, RunContext, RunOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Matched ids in batch order
    pub matched: Vec<String>,
    pub deleted: usize,
    pub failed: usize,
    /// Matched ids the topic filter contributed
    pub from_ai: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    NothingToDo(NothingToDo),
    FetchFailed(String),
    Completed(CleanupSummary),
}

pub async fn run_cleanup(ctx: &RunContext<'_>, options: &RunOptions) -> CleanupOutcome {
    let reporter = ctx.reporter;
    let filters = ctx.filters;
    reporter.heading("Starting Readwise Reader feed cleanup");

    if !filters.has_cleanup_filters() {
        reporter.warning("No active filters found. Nothing to clean up.");
        return CleanupOutcome::NothingToDo(NothingToDo::NoFilters);
    }

    let documents = match fetch_feed(ctx, options).await {
        Ok(documents) => documents,
        Err(message) => return CleanupOutcome::FetchFailed(message),
    };
    if documents.is_empty() {
        reporter.warning("No documents found in the requested time window.");
        return CleanupOutcome::NothingToDo(NothingToDo::NoDocuments);
    }

    let standard_ids = filter_documents(&documents, filters);
    let ai_ids = topic_matches(ctx, &documents).await;

    let matched = select_in_order(&documents, |id| {
        standard_ids.contains(id) || ai_ids.contains(id)
    });
    if matched.is_empty() {
        reporter.info("No documents matched any filter criteria.");
        return CleanupOutcome::NothingToDo(NothingToDo::NoMatches);
    }

    let mut summary = CleanupSummary {
        matched: matched.iter().map(|(id, _)| id.to_string()).collect(),
        from_ai: ai_ids.len(),
        dry_run: options.dry_run,
        ..CleanupSummary::default()
    };

    if options.dry_run {
        reporter.heading("Dry run: the following documents would be deleted");
        for (id, doc) in &matched {
            reporter.plain(&format!("  - {} (ID: {})", doc.display_title(), id));
        }
        report_summary(ctx, &summary);
        return CleanupOutcome::Completed(summary);
    }

    reporter.info(&format!("Deleting {} documents...", matched.len()));
    for (i, (id, doc)) in matched.iter().enumerate() {
        pace(i, options.mutation_delay).await;
        match ctx.reader.delete_document(id).await {
            Ok(()) => {
                summary.deleted += 1;
                tracing::debug!("Deleted '{}' ({})", doc.display_title(), id);
            }
            Err(e) => {
                summary.failed += 1;
                reporter.error(&format!("Failed to delete document {}: {}", id, e));
            }
        }
    }

    report_summary(ctx, &summary);
    CleanupOutcome::Completed(summary)
}

/// Documents whose id passes `keep`, first occurrence only
fn select_in_order<'d>(
    documents: &'d [Document],
    keep: impl Fn(&str) -> bool,
) -> Vec<(&'d str, &'d Document)> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter_map(|doc| doc.id().map(|id| (id, doc)))
        .filter(|(id, _)| keep(id) && seen.insert(*id))
        .collect()
}

/// Topic filter matches restricted to ids in the fetched batch
async fn topic_matches(ctx: &RunContext<'_>, documents: &[Document]) -> HashSet<String> {
    let topics = &ctx.filters.ai_topic_exclude;
    if topics.is_empty() {
        return HashSet::new();
    }

    let outcome = match ctx.topic_filter {
        Some(topic_filter) => {
            ctx.reporter.info(&format!(
                "Running AI topic analysis for {} topics",
                topics.len()
            ));
            topic_filter.filter_by_topic(documents, topics).await
        }
        None => TopicOutcome::Skipped(SkipReason::Disabled),
    };

    match outcome {
        TopicOutcome::Matched { ids, usage } => {
            let cost = ctx
                .topic_filter
                .zip(usage.as_ref())
                .and_then(|(filter, usage)| filter.estimate_cost(usage));
            if let Some(cost) = cost {
                ctx.reporter
                    .info(&format!("AI topic analysis cost: ${:.4}", cost));
            }

            let known: HashSet<&str> = documents.iter().filter_map(Document::id).collect();
            let (kept, unknown): (HashSet<String>, HashSet<String>) =
                ids.into_iter().partition(|id| known.contains(id.as_str()));
            if !unknown.is_empty() {
                tracing::warn!(
                    "Ignoring {} ids returned by the topic filter that are not in the batch: {:?}",
                    unknown.len(),
                    unknown
                );
            }

            ctx.reporter.info(&format!(
                "AI topic filter identified {} documents",
                kept.len()
            ));
            kept
        }
        TopicOutcome::Skipped(SkipReason::Disabled) => {
            ctx.reporter.warning(
                "AI topic filters are set but no AI provider is available. Skipping AI analysis.",
            );
            HashSet::new()
        }
        TopicOutcome::Skipped(SkipReason::NoEligibleDocuments) => {
            ctx.reporter
                .warning("No documents with text available for AI topic analysis.");
            HashSet::new()
        }
        TopicOutcome::Skipped(reason) => {
            tracing::debug!("AI topic analysis skipped: {:?}", reason);
            HashSet::new()
        }
        TopicOutcome::Failed(e) => {
            ctx.reporter.warning(&format!(
                "AI topic analysis failed, continuing with standard filters: {}",
                e
            ));
            HashSet::new()
        }
    }
}

fn report_summary(ctx: &RunContext<'_>, summary: &CleanupSummary) {
    let reporter = ctx.reporter;
    reporter.heading("--- Cleanup Summary ---");
    reporter.plain(&format!("Documents matching filters: {}", summary.matched.len()));
    if summary.from_ai > 0 {
        reporter.plain(&format!(
            "  (Including {} identified by AI topic filter)",
            summary.from_ai
        ));
    }

    if summary.dry_run {
        reporter.info("Dry run: no documents were deleted.");
        return;
    }

    reporter.success(&format!("Deleted {} documents", summary.deleted));
    if summary.failed > 0 {
        reporter.error(&format!("Failed to delete: {}", summary.failed));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ai::TopicFilter;
    use crate::filter::FilterConfig;
    use crate::report::{Level, MemoryReporter};
    use crate::testing::{Call, FakeReader, ScriptedProvider};
    use crate::Error;

    fn feed() -> Vec<Document> {
        vec![
            Document::new("1")
                .with_title("Weekly Sponsored Roundup")
                .with_summary("Deals and offers"),
            Document::new("2")
                .with_title("Rust 2024 edition")
                .with_summary("Language news"),
            Document::new("3")
                .with_title("Election night")
                .with_summary("Results from every state"),
        ]
    }

    fn filters(json: &str) -> FilterConfig {
        FilterConfig::from_json(json).unwrap()
    }

    fn deletes(reader: &FakeReader) -> Vec<String> {
        reader
            .mutation_calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_no_filters_skips_fetch() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = FilterConfig::default();
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        assert_eq!(outcome, CleanupOutcome::NothingToDo(NothingToDo::NoFilters));
        assert!(reader.calls().is_empty());
        assert!(reporter.contains(Level::Warning, "No active filters found"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_terminal() {
        let reader = FakeReader::failing_list("timed out");
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        assert!(matches!(outcome, CleanupOutcome::FetchFailed(m) if m.contains("timed out")));
        assert!(reader.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_feed() {
        let reader = FakeReader::new(vec![]);
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        assert_eq!(outcome, CleanupOutcome::NothingToDo(NothingToDo::NoDocuments));
    }

    #[tokio::test]
    async fn test_no_matches() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["podcast"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        assert_eq!(outcome, CleanupOutcome::NothingToDo(NothingToDo::NoMatches));
        assert!(reporter.contains(Level::Info, "No documents matched any filter criteria"));
        assert!(reader.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_mutations() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored", "election"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let outcome = run_cleanup(&ctx, &options).await;

        let CleanupOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.matched, vec!["1", "3"]);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.dry_run);
        assert!(reader.mutation_calls().is_empty());
        assert!(reporter.contains(Level::Plain, "  - Weekly Sponsored Roundup (ID: 1)"));
        assert!(reporter.contains(Level::Plain, "  - Election night (ID: 3)"));
    }

    #[tokio::test]
    async fn test_dry_run_is_idempotent() {
        let reader = FakeReader::new(feed());
        let filters = filters(r#"{"summary_exclude": ["deals"], "ai_topic_exclude": ["politics"]}"#);
        let topic_filter = TopicFilter::new(Arc::new(ScriptedProvider::matching(&["3"])));
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let mut runs = Vec::new();
        for _ in 0..2 {
            let reporter = MemoryReporter::new();
            let ctx = RunContext {
                reader: &reader,
                topic_filter: Some(&topic_filter),
                reporter: &reporter,
                filters: &filters,
            };
            runs.push(run_cleanup(&ctx, &options).await);
        }

        assert_eq!(runs[0], runs[1]);
        assert!(reader.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn test_union_of_standard_and_ai_without_duplicates() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored", "election"], "ai_topic_exclude": ["politics"]}"#);
        let topic_filter = TopicFilter::new(Arc::new(ScriptedProvider::matching(&["3", "99"])));
        let ctx = RunContext {
            reader: &reader,
            topic_filter: Some(&topic_filter),
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        let CleanupOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.matched, vec!["1", "3"]);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.from_ai, 1);
        assert_eq!(deletes(&reader), vec!["1", "3"]);
        assert!(reporter.contains(Level::Plain, "(Including 1 identified by AI topic filter)"));
    }

    #[tokio::test]
    async fn test_ai_failure_keeps_standard_deletions() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored"], "ai_topic_exclude": ["politics"]}"#);
        let provider = ScriptedProvider::new(vec![Err(Error::AiProvider("connection reset".into()))]);
        let topic_filter = TopicFilter::new(Arc::new(provider));
        let ctx = RunContext {
            reader: &reader,
            topic_filter: Some(&topic_filter),
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        let CleanupOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.matched, vec!["1"]);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.from_ai, 0);
        assert_eq!(deletes(&reader), vec!["1"]);
        assert!(reporter.contains(Level::Warning, "AI topic analysis failed"));
    }

    #[tokio::test]
    async fn test_ai_topics_without_provider_warns() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"ai_topic_exclude": ["politics"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        assert_eq!(outcome, CleanupOutcome::NothingToDo(NothingToDo::NoMatches));
        assert!(reporter.contains(Level::Warning, "no AI provider is available"));
    }

    #[tokio::test]
    async fn test_per_item_failures_are_tallied() {
        let reader = FakeReader::new(feed()).with_failing_ids(&["1"]);
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored", "rust", "election"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        let outcome = run_cleanup(&ctx, &RunOptions::default()).await;

        let CleanupOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(deletes(&reader), vec!["1", "2", "3"]);
        assert!(reporter.contains(Level::Error, "Failed to delete document 1"));
        assert!(reporter.contains(Level::Error, "Failed to delete: 1"));
        assert!(reporter.contains(Level::Success, "Deleted 2 documents"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_delay_between_deletes() {
        let reader = FakeReader::new(feed());
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored", "rust", "election"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };
        let options = RunOptions {
            mutation_delay: Duration::from_millis(1200),
            ..RunOptions::default()
        };

        let start = tokio::time::Instant::now();
        run_cleanup(&ctx, &options).await;

        assert_eq!(start.elapsed(), Duration::from_millis(2400));
    }

    #[tokio::test]
    async fn test_duplicate_documents_deleted_once() {
        let mut documents = feed();
        documents.push(Document::new("1").with_title("Weekly Sponsored Roundup"));
        let reader = FakeReader::new(documents);
        let reporter = MemoryReporter::new();
        let filters = filters(r#"{"title_exclude": ["sponsored"]}"#);
        let ctx = RunContext {
            reader: &reader,
            topic_filter: None,
            reporter: &reporter,
            filters: &filters,
        };

        run_cleanup(&ctx, &RunOptions::default()).await;

        assert_eq!(deletes(&reader), vec!["1"]);
    }
}
