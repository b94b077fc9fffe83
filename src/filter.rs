use crate::document::{DocumentKind, IndexedDocument};

/// Structural restrictions applied to the corpus before ranking.
///
/// All set criteria must hold. An unset criterion keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub kind: Option<DocumentKind>,
    pub labels: Vec<String>,
    /// Require every label instead of any one of them.
    pub label_match_all: bool,
    pub source_group: Option<String>,
}

impl DocumentFilter {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.labels.is_empty()
            && self.source_group.is_none()
    }

    pub fn matches(&self, doc: &IndexedDocument) -> bool {
        if self.kind.is_some_and(|k| k != doc.kind) {
            return false;
        }
        if let Some(group) = &self.source_group
            && *group != doc.source_group
        {
            return false;
        }
        self.matches_labels(&doc.tags)
    }

    fn matches_labels(&self, tags: &[String]) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        let has = |label: &String| tags.contains(&label.to_lowercase());
        if self.label_match_all {
            self.labels.iter().all(has)
        } else {
            self.labels.iter().any(has)
        }
    }

    /// Keep matching documents, preserving corpus order.
    pub fn apply<'a>(
        &self,
        corpus: &'a [IndexedDocument],
    ) -> Vec<&'a IndexedDocument> {
        corpus.iter().filter(|doc| self.matches(doc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(
        id: &str,
        kind: DocumentKind,
        tags: &[&str],
        group: &str,
    ) -> IndexedDocument {
        IndexedDocument {
            id: id.to_string(),
            kind,
            name: id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: String::new(),
            source_group: group.to_string(),
        }
    }

    fn corpus() -> Vec<IndexedDocument> {
        vec![
            doc("a", DocumentKind::Prompt, &["Frontend", "react"], "team"),
            doc("b", DocumentKind::Context, &["backend"], "team"),
            doc("c", DocumentKind::Prompt, &["react"], "personal"),
            doc("d", DocumentKind::Context, &[], "personal"),
        ]
    }

    fn ids(docs: &[&IndexedDocument]) -> Vec<String> {
        docs.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn empty_filter_keeps_all() {
        let corpus = corpus();
        let filter = DocumentFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&corpus).len(), 4);
    }

    #[test]
    fn kind_filter() {
        let corpus = corpus();
        let filter = DocumentFilter {
            kind: Some(DocumentKind::Context),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&corpus)), vec!["b", "d"]);
    }

    #[test]
    fn labels_any_is_case_insensitive() {
        let corpus = corpus();
        let filter = DocumentFilter {
            labels: vec!["FRONTEND".to_string(), "backend".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&corpus)), vec!["a", "b"]);
    }

    #[test]
    fn labels_all() {
        let corpus = corpus();
        let filter = DocumentFilter {
            labels: vec!["react".to_string(), "frontend".to_string()],
            label_match_all: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&corpus)), vec!["a"]);
    }

    #[test]
    fn group_filter() {
        let corpus = corpus();
        let filter = DocumentFilter {
            source_group: Some("personal".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&corpus)), vec!["c", "d"]);
    }

    #[test]
    fn unknown_group_yields_empty_corpus() {
        let corpus = corpus();
        let filter = DocumentFilter {
            source_group: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(filter.apply(&corpus).is_empty());
    }

    #[test]
    fn filters_compose_with_and() {
        let corpus = corpus();
        let filter = DocumentFilter {
            kind: Some(DocumentKind::Prompt),
            labels: vec!["react".to_string()],
            label_match_all: false,
            source_group: Some("personal".to_string()),
        };
        assert_eq!(ids(&filter.apply(&corpus)), vec!["c"]);
    }
}
