use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    document::IndexedDocument,
    scorer::{FieldWeights, SearchField, WeightedScorer},
};

pub const DEFAULT_LIMIT: usize = 20;

/// Accept anything that matched at all.
pub const DEFAULT_THRESHOLD: f64 = -10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub query: String,
    pub limit: usize,
    pub threshold: f64,
    pub enable_transliteration: bool,
    pub weights: FieldWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
            enable_transliteration: true,
            weights: FieldWeights::default(),
        }
    }
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// One ranked hit, borrowing the document from the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a> {
    pub score: f64,
    pub document: &'a IndexedDocument,
    pub matched_fields: Vec<SearchField>,
}

/// Ranks a corpus against a query.
///
/// Stateless: every call builds its own matcher, so one engine can serve
/// concurrent callers over the same corpus snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score every document, drop non-matches, sort by score descending
    /// (stable, so ties keep corpus order) and keep the first `limit`.
    ///
    /// A blank query returns the corpus as is with a uniform score of 1.
    pub fn search<'a, I>(
        &self,
        corpus: I,
        options: &SearchOptions,
    ) -> Vec<SearchResult<'a>>
    where
        I: IntoIterator<Item = &'a IndexedDocument>,
    {
        if options.limit == 0 {
            return Vec::new();
        }

        let query = options.query.trim();
        if query.is_empty() {
            return corpus
                .into_iter()
                .take(options.limit)
                .map(|document| SearchResult {
                    score: 1.0,
                    document,
                    matched_fields: Vec::new(),
                })
                .collect();
        }

        let started = Instant::now();
        let mut scorer = WeightedScorer::new();
        let mut scanned = 0usize;
        let mut results: Vec<SearchResult<'a>> = corpus
            .into_iter()
            .inspect(|_| scanned += 1)
            .filter_map(|document| {
                scorer
                    .score_document(
                        document,
                        query,
                        options.threshold,
                        options.enable_transliteration,
                        &options.weights,
                    )
                    .map(|s| SearchResult {
                        score: s.score,
                        document,
                        matched_fields: s.matched_fields,
                    })
            })
            .collect();

        let matched = results.len();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(options.limit);

        tracing::debug!(
            query,
            scanned,
            matched,
            returned = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "ranked corpus"
        );

        results
    }
}
