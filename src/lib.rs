//! promptdex - weighted fuzzy search over prompt and context templates.
//!
//! Templates from several repositories are kept in a local catalog and
//! ranked against a keyword by a fuzzy subsequence matcher. Chinese names
//! and summaries also match Latin keywords through their pinyin, either
//! spelled out (`qianduan`, `qian duan`) or as initials (`qd`).
//!
//! # Quick start
//!
//! ```
//! use promptdex::{IndexedDocument, DocumentKind, RankingEngine, SearchOptions};
//!
//! let corpus = vec![IndexedDocument {
//!     id: "x".to_string(),
//!     kind: DocumentKind::Prompt,
//!     name: "前端评审".to_string(),
//!     tags: vec![],
//!     summary: String::new(),
//!     source_group: "templates".to_string(),
//! }];
//!
//! let results = RankingEngine::new().search(&corpus, &SearchOptions::new("qianduan"));
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].matched_fields[0].as_str(), "name");
//! ```

pub mod catalog_db;
pub mod cli;
pub mod document;
pub mod error;
pub mod filter;
pub mod import;
pub mod matcher;
pub mod mcp;
pub mod ranking;
pub mod scorer;
pub mod search;
pub mod settings;
pub mod transliterate;

pub use catalog_db::{CatalogDb, CorpusProvider};
pub use document::{DocumentKey, DocumentKind, IndexedDocument};
pub use error::{Error, Result};
pub use filter::DocumentFilter;
pub use ranking::{RankingEngine, SearchOptions, SearchResult};
pub use scorer::{FieldWeights, SearchField};
