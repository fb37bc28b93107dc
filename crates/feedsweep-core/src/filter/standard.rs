use std::collections::HashSet;

use super::config::FilterConfig;
use super::matcher::matches;
use crate::document::Document;

/// Whether any standard criterion selects `doc` (OR across fields)
pub fn document_matches(doc: &Document, filters: &FilterConfig) -> bool {
    matches(doc.title(), &filters.title_exclude)
        || matches(doc.summary(), &filters.summary_exclude)
        || matches(doc.source_url(), &filters.url_exclude)
        || doc
            .author()
            .is_some_and(|author| matches(author, &filters.author_exclude))
}

/// Ids of documents selected by the title, summary, URL and author filters
///
/// Documents without an id are skipped. With no standard lists set the result
/// is always empty.
pub fn filter_documents(documents: &[Document], filters: &FilterConfig) -> HashSet<String> {
    if !filters.has_standard_filters() {
        return HashSet::new();
    }

    let matched: HashSet<String> = documents
        .iter()
        .filter_map(|doc| doc.id().map(|id| (id, doc)))
        .filter(|(_, doc)| document_matches(doc, filters))
        .map(|(id, _)| id.to_string())
        .collect();

    tracing::debug!(
        "Standard filters matched {} of {} documents",
        matched.len(),
        documents.len()
    );

    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<Document> {
        vec![
            Document::new("1").with_title("Cats and dogs"),
            Document::new("2").with_title("Space news"),
            Document::new("3").with_title(""),
        ]
    }

    fn ids(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_filter_selects_matching_document() {
        let filters = FilterConfig {
            title_exclude: vec!["cats".into()],
            ..Default::default()
        };
        assert_eq!(filter_documents(&batch(), &filters), ids(&["1"]));
    }

    #[test]
    fn test_empty_title_list_matches_nothing() {
        let filters = FilterConfig {
            title_exclude: vec![],
            ..Default::default()
        };
        assert!(filter_documents(&batch(), &filters).is_empty());
    }

    #[test]
    fn test_all_lists_empty_returns_empty_set() {
        let filters = FilterConfig {
            ai_topic_exclude: vec!["theater".into()],
            author_save_later: vec!["Jane".into()],
            ..Default::default()
        };
        assert!(filter_documents(&batch(), &filters).is_empty());
    }

    #[test]
    fn test_fields_are_ored() {
        let docs = vec![
            Document::new("a").with_title("Hello"),
            Document::new("b").with_source_url("https://ads.example.com/x"),
            Document::new("c").with_author("Spam Bot"),
            Document::new("d").with_summary("A sponsored roundup"),
            Document::new("e").with_title("Unrelated"),
        ];
        let filters = FilterConfig {
            title_exclude: vec!["hello".into()],
            url_exclude: vec!["ADS.example".into()],
            author_exclude: vec!["spam".into()],
            summary_exclude: vec!["sponsored".into()],
            ..Default::default()
        };

        assert_eq!(filter_documents(&docs, &filters), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_documents_without_id_are_skipped() {
        let mut anonymous = Document::default().with_title("Cats everywhere");
        let empty_id = Document::new("").with_title("More cats");
        anonymous.author = Some("cats".into());

        let filters = FilterConfig {
            title_exclude: vec!["cats".into()],
            ..Default::default()
        };

        assert!(filter_documents(&[anonymous, empty_id], &filters).is_empty());
    }

    #[test]
    fn test_document_matching_several_fields_counted_once() {
        let docs = vec![Document::new("1")
            .with_title("cats")
            .with_author("cats")
            .with_source_url("https://cats.example")];
        let filters = FilterConfig {
            title_exclude: vec!["cats".into()],
            url_exclude: vec!["cats".into()],
            author_exclude: vec!["cats".into()],
            ..Default::default()
        };

        assert_eq!(filter_documents(&docs, &filters).len(), 1);
    }
}
