use std::collections::HashSet;

use super::config::FilterConfig;
use super::matcher::matches;
use crate::document::{Document, Location};

/// A pending move of one document to another list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAction {
    pub doc_id: String,
    pub location: Location,
}

/// Decide where a document should be saved, if anywhere
///
/// The "later" list is checked first, so an author on both lists is always
/// saved to later.
pub fn resolve_save_location(doc: &Document, filters: &FilterConfig) -> Option<Location> {
    let author = doc.author()?;

    if matches(author, &filters.author_save_later) {
        return Some(Location::Later);
    }
    if matches(author, &filters.author_save_inbox) {
        return Some(Location::New);
    }
    None
}

/// Save actions for `documents`, in batch order
///
/// A document listed twice yields one action, at its first position.
pub fn collect_save_actions(documents: &[Document], filters: &FilterConfig) -> Vec<SaveAction> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter_map(|doc| {
            let doc_id = doc.id()?;
            let location = resolve_save_location(doc, filters)?;
            seen.insert(doc_id).then(|| SaveAction {
                doc_id: doc_id.to_string(),
                location,
            })
        })
        .collect()
}
