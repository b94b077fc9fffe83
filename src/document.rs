use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Coarse template type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Prompt,
    Context,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "context" => Ok(Self::Context),
            other => Err(Error::Config(format!(
                "unknown template type '{other}' (expected prompt or context)"
            ))),
        }
    }
}

/// A template as produced by the indexer. Read-only during a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDocument {
    pub id: String,
    pub kind: DocumentKind,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source_group: String,
}

impl IndexedDocument {
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(&self.source_group, &self.id)
    }
}

/// Identity of a template: ids are only unique within one source group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub group: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(group: &str, id: &str) -> Self {
        Self {
            group: group.to_string(),
            id: id.to_string(),
        }
    }

    /// Key used for the `documents` table. The NUL separator keeps every
    /// group's rows contiguous and ordered by id.
    pub fn storage_key(&self) -> String {
        format!("{}\0{}", self.group, self.id)
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        let (group, id) = key.split_once('\0')?;
        Some(Self::new(group, id))
    }

    /// Prefix matching every storage key of `group`.
    pub fn group_prefix(group: &str) -> String {
        format!("{group}\0")
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.id)
    }
}

/// A user supplied reference to a template: `group:id` or a bare `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    Qualified(DocumentKey),
    Bare(String),
}

impl DocumentRef {
    pub fn parse(reference: &str) -> Self {
        match reference.split_once(':') {
            Some((group, id)) if !group.is_empty() && !id.is_empty() => {
                Self::Qualified(DocumentKey::new(group, id))
            }
            _ => Self::Bare(reference.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            "Prompt".parse::<DocumentKind>().unwrap(),
            DocumentKind::Prompt
        );
        assert_eq!(
            " context ".parse::<DocumentKind>().unwrap(),
            DocumentKind::Context
        );
        assert!("snippet".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn document_json_uses_camel_case_and_defaults() {
        let doc: IndexedDocument = serde_json::from_str(
            r#"{"id":"a","kind":"context","name":"A","sourceGroup":"g"}"#,
        )
        .unwrap();
        assert_eq!(doc.kind, DocumentKind::Context);
        assert!(doc.tags.is_empty());
        assert!(doc.summary.is_empty());
        assert_eq!(doc.source_group, "g");

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"sourceGroup\":\"g\""));
    }

    #[test]
    fn storage_key_roundtrip() {
        let key = DocumentKey::new("templates", "frontend-review-v1");
        let raw = key.storage_key();
        assert!(raw.starts_with(&DocumentKey::group_prefix("templates")));
        assert_eq!(DocumentKey::from_storage_key(&raw), Some(key));
    }

    #[test]
    fn same_id_in_two_groups_are_distinct_keys() {
        let a = DocumentKey::new("team", "review");
        let b = DocumentKey::new("personal", "review");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "team:review");
    }

    #[test]
    fn reference_parsing() {
        assert_eq!(
            DocumentRef::parse("team:review"),
            DocumentRef::Qualified(DocumentKey::new("team", "review"))
        );
        assert_eq!(
            DocumentRef::parse("review"),
            DocumentRef::Bare("review".to_string())
        );
        assert_eq!(
            DocumentRef::parse(":review"),
            DocumentRef::Bare(":review".to_string())
        );
    }
}
