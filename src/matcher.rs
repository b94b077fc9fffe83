//! Per-field scoring: direct fuzzy match plus the pinyin fallbacks.

use nucleo_matcher::{
    Config,
    Matcher,
    Utf32Str,
    chars,
    pattern::{Atom, AtomKind, CaseMatching, Normalization},
};

use crate::transliterate::Transliteration;

/// Score meaning "this candidate did not match".
pub const NO_MATCH: f64 = f64::NEG_INFINITY;

/// Width of one match tier. Raw nucleo scores are `u16`, so a higher tier
/// always outranks a lower one regardless of the fuzzy score inside it.
const TIER_SPAN: f64 = 65_536.0;

/// Multiplier for candidates computed on the transliteration. A direct
/// match at the same tier (prefix or better) always outscores it.
const TRANSLITERATION_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    Subsequence = 0,
    Substring = 1,
    Prefix = 2,
    Exact = 3,
}

impl MatchTier {
    /// Tier of `query` within `text`, compared the way the fuzzy atom
    /// compares characters: case folded, and with diacritics stripped
    /// unless the query itself carries some.
    fn classify(text: &str, query: &str) -> Self {
        let strip = query.chars().all(|c| chars::normalize(c) == c);
        let text = fold(text, strip);
        let query = fold(query, strip);

        if text == query {
            Self::Exact
        } else if text.starts_with(&query) {
            Self::Prefix
        } else if text.contains(&query) {
            Self::Substring
        } else {
            Self::Subsequence
        }
    }
}

fn fold(text: &str, strip_diacritics: bool) -> String {
    text.chars()
        .map(|c| {
            let c = if strip_diacritics { chars::normalize(c) } else { c };
            chars::to_lower_case(c)
        })
        .collect()
}

/// An ordered, case-insensitive subsequence scorer. Higher is better,
/// `None` means the query is not a subsequence of the text.
pub trait SubsequenceScorer {
    fn score(&mut self, text: &str, query: &str) -> Option<f64>;
}

/// [`SubsequenceScorer`] backed by nucleo's fuzzy atom, with an
/// exact > prefix > substring > scattered tiering on top.
pub struct NucleoScorer {
    matcher: Matcher,
    atom: Option<(String, Atom)>,
    buf: Vec<char>,
}

impl NucleoScorer {
    pub fn new() -> Self {
        let mut config = Config::DEFAULT;
        config.prefer_prefix = true;
        Self {
            matcher: Matcher::new(config),
            atom: None,
            buf: Vec::with_capacity(64),
        }
    }

    fn prepare(&mut self, query: &str) {
        let stale = self.atom.as_ref().is_none_or(|(q, _)| q != query);
        if stale {
            let atom = Atom::new(
                query,
                CaseMatching::Ignore,
                Normalization::Smart,
                AtomKind::Fuzzy,
                false,
            );
            self.atom = Some((query.to_string(), atom));
        }
    }
}

impl Default for NucleoScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NucleoScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NucleoScorer").finish_non_exhaustive()
    }
}

impl SubsequenceScorer for NucleoScorer {
    fn score(&mut self, text: &str, query: &str) -> Option<f64> {
        if query.is_empty() || text.is_empty() {
            return None;
        }
        self.prepare(query);
        let (_, atom) = self.atom.as_ref()?;
        self.buf.clear();
        let haystack = Utf32Str::new(text, &mut self.buf);
        let fuzzy = atom.score(haystack, &mut self.matcher)?;

        let tier = MatchTier::classify(text, query);
        Some(f64::from(tier as u8) * TIER_SPAN + f64::from(fuzzy))
    }
}

/// Scores one field's text against the query.
///
/// Weight-agnostic: the caller multiplies by the field weight.
#[derive(Debug, Default)]
pub struct FieldMatcher<S = NucleoScorer> {
    scorer: S,
}

impl FieldMatcher {
    pub fn new() -> Self {
        Self::with_scorer(NucleoScorer::new())
    }
}

impl<S: SubsequenceScorer> FieldMatcher<S> {
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    /// Best score over the direct match and, for CJK text with
    /// transliteration enabled, the spaced, joined and initials renderings.
    /// Returns [`NO_MATCH`] if no candidate matched.
    pub fn score(
        &mut self,
        field_text: &str,
        query: &str,
        enable_transliteration: bool,
    ) -> f64 {
        let query = query.trim();
        if query.is_empty() || field_text.is_empty() {
            return NO_MATCH;
        }

        let mut best = self.scorer.score(field_text, query).unwrap_or(NO_MATCH);

        if enable_transliteration
            && let Some(latin) = Transliteration::of(field_text)
        {
            let query = query.to_lowercase();
            for rendering in [&latin.spaced, &latin.joined, &latin.initials] {
                if let Some(s) = self.scorer.score(rendering, &query) {
                    best = best.max(s * TRANSLITERATION_FACTOR);
                }
            }
        }

        best
    }
}
