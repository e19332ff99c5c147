//! Text Normalizer
//!
//! Lower-cases and tokenizes a video label, and extracts an optional
//! age-in-months signal ("12 meses", "4 months", "9mo").
//!
//! Diacritics are folded (á→a, ñ→n, ...) after lower-casing, whether the text
//! arrives precomposed or decomposed. The same folding is applied to milestone
//! text and lexicon entries so that every substring comparison in the scorer
//! works on one alphabet.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// `<digits><optional whitespace><month word>`, first match wins
static AGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+)\s*(?:meses|mes|months|month|mos|mo)\b")
        .expect("age pattern is a valid regex")
});

/// Normalized view of a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLabel {
    /// Word tokens in label order (short tokens included)
    pub tokens: Vec<String>,

    /// Age signal in months, if the label states one
    pub age_months: Option<u32>,

    /// Tokens joined by single spaces; lexicon keys are matched against this
    pub text: String,
}

/// Normalize a label into tokens and an optional age
pub fn normalize(label: &str) -> NormalizedLabel {
    let folded = fold(label);
    let tokens = tokenize(&folded);
    let text = tokens.join(" ");
    let age_months = extract_age_months(&folded);

    NormalizedLabel {
        tokens,
        age_months,
        text,
    }
}

/// Lower-case and strip combining marks, keeping every other character
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Fold, then reduce to space-separated tokens
pub fn normalize_phrase(text: &str) -> String {
    tokenize(&fold(text)).join(" ")
}

/// Maximal runs of alphanumeric characters; everything else separates
fn tokenize(folded: &str) -> Vec<String> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_age_months(folded: &str) -> Option<u32> {
    AGE_PATTERN
        .captures(folded)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
