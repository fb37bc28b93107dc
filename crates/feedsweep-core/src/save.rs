//! Move feed documents from chosen authors to the inbox or the later list

use std::collections::HashMap;

use crate::document::Document;
use crate::filter::{collect_save_actions, SaveAction};
use crate::run::{fetch_feed, pace, NothingToDo, RunContext, RunOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub actions: Vec<SaveAction>,
    pub saved: usize,
    pub failed: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToDo(NothingToDo),
    FetchFailed(String),
    Completed(SaveSummary),
}

pub async fn run_save(ctx: &RunContext<'_>, options: &RunOptions) -> SaveOutcome {
    let reporter = ctx.reporter;
    reporter.heading("Starting Readwise Reader author saves");

    if !ctx.filters.has_save_filters() {
        reporter.warning("No author save filters found. Nothing to save.");
        return SaveOutcome::NothingToDo(NothingToDo::NoFilters);
    }

    let documents: Vec<Document> = match fetch_feed(ctx, options).await {
        Ok(documents) => documents
            .into_iter()
            .filter(|doc| !doc.location.is_some_and(|l| l.is_done()))
            .collect(),
        Err(message) => return SaveOutcome::FetchFailed(message),
    };
    if documents.is_empty() {
        reporter.warning("No unsaved documents found in the requested time window.");
        return SaveOutcome::NothingToDo(NothingToDo::NoDocuments);
    }

    let actions = collect_save_actions(&documents, ctx.filters);
    if actions.is_empty() {
        reporter.info("No documents matched the author save filters.");
        return SaveOutcome::NothingToDo(NothingToDo::NoMatches);
    }

    let titles: HashMap<&str, &str> = documents
        .iter()
        .filter_map(|doc| doc.id().map(|id| (id, doc.display_title())))
        .collect();
    let title_of = |id: &str| titles.get(id).copied().unwrap_or("N/A");

    let mut summary = SaveSummary {
        dry_run: options.dry_run,
        ..SaveSummary::default()
    };

    if options.dry_run {
        reporter.heading("Dry run: the following documents would be saved");
        for action in &actions {
            reporter.plain(&format!(
                "  - {} (ID: {}) -> {}",
                title_of(&action.doc_id),
                action.doc_id,
                action.location
            ));
        }
        summary.actions = actions;
        report_summary(ctx, &summary);
        return SaveOutcome::Completed(summary);
    }

    reporter.info(&format!("Saving {} documents...", actions.len()));
    for (i, action) in actions.iter().enumerate() {
        pace(i, options.mutation_delay).await;
        match ctx
            .reader
            .update_location(&action.doc_id, action.location)
            .await
        {
            Ok(()) => {
                summary.saved += 1;
                reporter.plain(&format!(
                    "  Saved '{}' to {}",
                    title_of(&action.doc_id),
                    action.location
                ));
            }
            Err(e) => {
                summary.failed += 1;
                reporter.error(&format!(
                    "Failed to save document {}: {}",
                    action.doc_id, e
                ));
            }
        }
    }

    summary.actions = actions;
    report_summary(ctx, &summary);
    SaveOutcome::Completed(summary)
}

fn report_summary(ctx: &RunContext<'_>, summary: &SaveSummary) {
    let reporter = ctx.reporter;
    reporter.heading("--- Save Summary ---");
    reporter.plain(&format!(
        "Documents matching author filters: {}",
        summary.actions.len()
    ));

    if summary.dry_run {
        reporter.info("Dry run: no documents were moved.");
        return;
    }

    reporter.success(&format!("Saved {} documents", summary.saved));
    if summary.failed > 0 {
        reporter.error(&format!("Failed to save: {}", summary.failed));
    }
}
