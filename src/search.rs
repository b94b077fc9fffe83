use serde::Serialize;

use crate::{
    catalog_db::{CatalogDb, CorpusProvider},
    cli::SearchArgs,
    document::{DocumentKey, DocumentKind, DocumentRef, IndexedDocument},
    error::{Error, Result},
    filter::DocumentFilter,
    ranking::{RankingEngine, SearchOptions},
    scorer::FieldWeights,
};

/// A ranked template, detached from the corpus it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTemplate {
    pub rank: usize,
    pub score: f64,
    pub id: String,
    pub source_group: String,
    pub kind: DocumentKind,
    pub name: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub matched_fields: Vec<&'static str>,
}

impl RankedTemplate {
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(&self.source_group, &self.id)
    }
}

/// Build the structural filter from command-line arguments.
pub fn build_filter(args: &SearchArgs) -> Result<DocumentFilter> {
    let kind = args
        .kind
        .as_deref()
        .map(str::parse::<DocumentKind>)
        .transpose()?;
    Ok(DocumentFilter {
        kind,
        labels: args.labels.clone(),
        label_match_all: args.label_all,
        source_group: args.repo.clone(),
    })
}

/// Build ranking options from command-line arguments on top of the stored
/// weights and result limit.
pub fn build_options(
    args: &SearchArgs,
    stored_weights: FieldWeights,
    default_limit: usize,
) -> Result<SearchOptions> {
    let mut weights = stored_weights;
    for assignment in &args.weights {
        weights.apply_override(assignment)?;
    }

    let mut options = SearchOptions {
        query: args.query.clone().unwrap_or_default(),
        limit: args.max_results.unwrap_or(default_limit),
        enable_transliteration: !args.no_pinyin,
        weights,
        ..SearchOptions::default()
    };
    if let Some(threshold) = args.threshold {
        options.threshold = threshold;
    }
    Ok(options)
}

/// Execute a search over the provider's corpus.
///
/// 1. Load the corpus (only the requested repository when `--repo` is set)
/// 2. Apply type and label filters
/// 3. Rank with the fuzzy engine
/// 4. Number the results from 1
pub fn execute_search(
    args: &SearchArgs,
    provider: &impl CorpusProvider,
    stored_weights: FieldWeights,
    default_limit: usize,
) -> Result<Vec<RankedTemplate>> {
    let filter = build_filter(args)?;
    let options = build_options(args, stored_weights, default_limit)?;

    if let Some(repo) = &args.repo
        && !provider.source_groups()?.contains(repo)
    {
        tracing::warn!(repo = %repo, "unknown repository");
    }

    let groups = args.repo.clone().map(|repo| vec![repo]);
    let corpus = provider.corpus(groups.as_deref())?;
    let candidates = if filter.is_empty() {
        corpus.iter().collect()
    } else {
        filter.apply(&corpus)
    };
    tracing::debug!(
        corpus = corpus.len(),
        candidates = candidates.len(),
        "applied filters"
    );

    let results = RankingEngine::new().search(candidates, &options);

    Ok(results
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankedTemplate {
            rank: i + 1,
            score: r.score,
            id: r.document.id.clone(),
            source_group: r.document.source_group.clone(),
            kind: r.document.kind,
            name: r.document.name.clone(),
            tags: r.document.tags.clone(),
            summary: r.document.summary.clone(),
            matched_fields: r
                .matched_fields
                .iter()
                .map(|f| f.as_str())
                .collect(),
        })
        .collect())
}

/// Resolve a reference to exactly one template.
///
/// A bare id found in several repositories is ambiguous and must be
/// qualified as `repo:id`.
pub fn resolve_reference(
    catalog: &CatalogDb,
    reference: &str,
) -> Result<IndexedDocument> {
    let not_found = || Error::NotFound {
        kind: "template",
        name: reference.to_string(),
    };

    match DocumentRef::parse(reference) {
        DocumentRef::Qualified(key) => {
            if let Some(doc) = catalog.get_document(&key)? {
                return Ok(doc);
            }
            // Ids may themselves contain ':'.
            resolve_bare(catalog, reference)?.ok_or_else(not_found)
        }
        DocumentRef::Bare(id) => {
            resolve_bare(catalog, &id)?.ok_or_else(not_found)
        }
    }
}

fn resolve_bare(
    catalog: &CatalogDb,
    id: &str,
) -> Result<Option<IndexedDocument>> {
    let mut matches: Vec<IndexedDocument> = catalog
        .list_documents()?
        .into_iter()
        .filter(|d| d.id == id)
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(Error::Ambiguous {
            id: id.to_string(),
            candidates: matches.iter().map(|d| d.key().to_string()).collect(),
        }),
    }
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[RankedTemplate]) -> String {
    if results.is_empty() {
        return "No templates found.".to_string();
    }

    let mut out = String::new();
    for r in results {
        out.push_str(&format!(
            "{:>3}. [{:.1}] {} ({})\n",
            r.rank,
            r.score,
            r.key(),
            r.kind
        ));
        out.push_str(&format!("     {}", r.name));
        if !r.matched_fields.is_empty() {
            out.push_str(&format!("  <{}>", r.matched_fields.join(", ")));
        }
        out.push('\n');
        if !r.summary.is_empty() {
            out.push_str(&format!("     {}\n", truncate(&r.summary, 72)));
        }
    }
    out.push_str(&format!("\n{} template(s)", results.len()));
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<'a> {
    query: &'a str,
    result_count: usize,
    results: &'a [RankedTemplate],
}

/// Format results as JSON output.
pub fn format_json(results: &[RankedTemplate], query: &str) -> Result<String> {
    Ok(serde_json::to_string(&SearchResponse {
        query,
        result_count: results.len(),
        results,
    })?)
}

/// Format results as qualified ids (one per line).
pub fn format_ids(results: &[RankedTemplate]) -> String {
    results
        .iter()
        .map(|r| r.key().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single template for `show`.
pub fn format_document(doc: &IndexedDocument) -> String {
    let mut out = format!(
        "{}\nname: {}\ntype: {}\n",
        doc.key(),
        doc.name,
        doc.kind
    );
    if !doc.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", doc.tags.join(", ")));
    }
    if !doc.summary.is_empty() {
        out.push_str(&format!("summary: {}\n", doc.summary));
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
