use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[.\-]").expect("valid regex");
}

/// Controls which substrings of a token become terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Let substrings run to the end of the token (`j <= L`). With `false`
    /// they stop at `j < L`, so no suffix of a token, the token itself
    /// included, is indexed.
    pub inclusive_end: bool,
    /// Skip substrings longer than this many characters.
    pub max_term_chars: Option<usize>,
}

impl Default for Expansion {
    fn default() -> Self {
        Self { inclusive_end: true, max_term_chars: None }
    }
}

/// Unicode lowercase followed by NFC composition.
pub fn fold(text: &str) -> String {
    text.to_lowercase().nfc().collect()
}

/// Replaces `.` and `-` with spaces and folds case.
pub fn normalize(line: &str) -> String {
    fold(&SEPARATORS.replace_all(line, " "))
}

pub fn tokenize(line: &str) -> Vec<String> {
    normalize(line)
        .split_whitespace()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Every contiguous substring `token[i..j]` counted in characters.
pub fn expand_token<'a>(token: &'a str, expansion: &Expansion) -> Vec<&'a str> {
    let bounds: Vec<usize> = token
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(token.len()))
        .collect();
    let chars = bounds.len() - 1;
    let last_end = if expansion.inclusive_end { chars } else { chars.saturating_sub(1) };

    let mut out = Vec::new();
    for i in 0..chars {
        let widest = expansion.max_term_chars.map_or(last_end, |cap| last_end.min(i + cap));
        for j in i + 1..=widest {
            out.push(&token[bounds[i]..bounds[j]]);
        }
    }
    out
}

/// The deduplicated terms a line is indexed under.
pub fn terms(line: &str, expansion: &Expansion) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for token in tokenize(line) {
        for term in expand_token(&token, expansion) {
            if !out.contains(term) {
                out.insert(term.to_owned());
            }
        }
    }
    out
}

/// Splits and folds a search term the way indexed text is, so
/// `Hans-Peter` looks up `hans` and `peter`.
pub fn query_tokens(term: &str) -> Vec<String> {
    tokenize(term)
}
