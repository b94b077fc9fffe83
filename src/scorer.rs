use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    document::IndexedDocument,
    error::Error,
    matcher::{FieldMatcher, NucleoScorer, SubsequenceScorer},
};

/// A searchable field of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Id,
    Name,
    Tags,
    Summary,
}

impl SearchField {
    /// Scoring order. `matched_fields` follows this order.
    pub const ALL: [Self; 4] =
        [Self::Id, Self::Name, Self::Tags, Self::Summary];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Tags => "tags",
            Self::Summary => "summary",
        }
    }

    /// The text matched for this field. Tags are joined with a space.
    pub fn text(self, doc: &IndexedDocument) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Id => doc.id.as_str().into(),
            Self::Name => doc.name.as_str().into(),
            Self::Tags => doc.tags.join(" ").into(),
            Self::Summary => doc.summary.as_str().into(),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown field '{s}' (expected id, name, tags or summary)"
                ))
            })
    }
}

/// Per-field score multipliers.
///
/// Weights are raw multipliers: no normalization, and a negative weight
/// inverts that field's contribution instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub id: f64,
    pub name: f64,
    pub tags: f64,
    pub summary: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            id: 1.0,
            name: 1.0,
            tags: 0.8,
            summary: 0.5,
        }
    }
}

impl FieldWeights {
    pub fn get(&self, field: SearchField) -> f64 {
        match field {
            SearchField::Id => self.id,
            SearchField::Name => self.name,
            SearchField::Tags => self.tags,
            SearchField::Summary => self.summary,
        }
    }

    pub fn set(&mut self, field: SearchField, weight: f64) {
        match field {
            SearchField::Id => self.id = weight,
            SearchField::Name => self.name = weight,
            SearchField::Tags => self.tags = weight,
            SearchField::Summary => self.summary = weight,
        }
    }

    /// Apply a `field=value` override such as `name=2.5`.
    pub fn apply_override(
        &mut self,
        assignment: &str,
    ) -> crate::error::Result<()> {
        let (field, value) = assignment.split_once('=').ok_or_else(|| {
            Error::Config(format!("expected field=value, got '{assignment}'"))
        })?;
        let field: SearchField = field.parse()?;
        let weight = parse_weight(value)?;
        self.set(field, weight);
        Ok(())
    }
}

/// Parse a weight value. Any finite number is accepted, negatives included.
pub fn parse_weight(value: &str) -> crate::error::Result<f64> {
    let weight: f64 = value.trim().parse().map_err(|_| {
        Error::Config(format!("invalid weight '{value}'"))
    })?;
    if !weight.is_finite() {
        return Err(Error::Config(format!("weight must be finite: {value}")));
    }
    Ok(weight)
}

/// Outcome of scoring one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentScore {
    pub score: f64,
    pub matched_fields: Vec<SearchField>,
}

/// Sums weighted field scores for a document.
#[derive(Debug, Default)]
pub struct WeightedScorer<S = NucleoScorer> {
    matcher: FieldMatcher<S>,
}

impl WeightedScorer {
    pub fn new() -> Self {
        Self::with_matcher(FieldMatcher::new())
    }
}

impl<S: SubsequenceScorer> WeightedScorer<S> {
    pub fn with_matcher(matcher: FieldMatcher<S>) -> Self {
        Self { matcher }
    }

    /// Score `doc` against `query`.
    ///
    /// A field contributes `raw * weight` when its raw score is strictly
    /// above `threshold`. Returns `None` when no field contributed.
    pub fn score_document(
        &mut self,
        doc: &IndexedDocument,
        query: &str,
        threshold: f64,
        enable_transliteration: bool,
        weights: &FieldWeights,
    ) -> Option<DocumentScore> {
        let mut total = 0.0;
        let mut matched_fields = Vec::new();

        for field in SearchField::ALL {
            let text = field.text(doc);
            if text.is_empty() {
                continue;
            }
            let raw = self.matcher.score(&text, query, enable_transliteration);
            if raw > threshold {
                total += raw * weights.get(field);
                matched_fields.push(field);
            }
        }

        (!matched_fields.is_empty()).then_some(DocumentScore {
            score: total,
            matched_fields,
        })
    }
}
