//! Pinyin transliteration of CJK text.
//!
//! Each CJK ideograph becomes one tone-stripped lowercase syllable, ASCII
//! letters and digits become single-character tokens, and everything else
//! is dropped. Ideographs with no known reading are skipped.

use pinyin::ToPinyin;

const CJK_UNIFIED: std::ops::RangeInclusive<u32> = 0x4E00..=0x9FFF;

fn is_cjk(c: char) -> bool {
    CJK_UNIFIED.contains(&u32::from(c))
}

/// True if any code point of `text` is a CJK unified ideograph.
pub fn detects_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Convert `text` to Latin syllable tokens.
///
/// ```
/// use promptdex::transliterate::transliterate;
///
/// assert_eq!(transliterate("前端 v2"), vec!["qian", "duan", "v", "2"]);
/// ```
pub fn transliterate(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for c in text.chars() {
        if is_cjk(c) {
            if let Some(py) = c.to_pinyin() {
                tokens.push(py.plain().to_string());
            }
        } else if c.is_ascii_alphanumeric() {
            tokens.push(c.to_ascii_lowercase().to_string());
        }
    }
    tokens
}

/// First letter of every token.
pub fn initials(tokens: &[String]) -> String {
    tokens.iter().filter_map(|t| t.chars().next()).collect()
}

/// The three Latin renderings of a field that the matcher tries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transliteration {
    /// Tokens joined with a space (`qian duan`).
    pub spaced: String,
    /// Tokens concatenated (`qianduan`).
    pub joined: String,
    /// First letter of each token (`qd`).
    pub initials: String,
}

impl Transliteration {
    /// Returns `None` when `text` has no CJK content or nothing mapped.
    pub fn of(text: &str) -> Option<Self> {
        if !detects_cjk(text) {
            return None;
        }
        let tokens = transliterate(text);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            spaced: tokens.join(" "),
            joined: tokens.concat(),
            initials: initials(&tokens),
        })
    }
}
