//! Keyword normalization.
//!
//! Upstream services hand back keywords in every shape imaginable: one
//! delimited string, a list, or nothing. [`normalize`] flattens them into a
//! short, case-insensitively unique list; [`fallback_keywords`] builds the
//! last-resort list from the row's own tags, notes and title.

use std::collections::HashSet;

/// Upper bound on keywords kept per item
pub const MAX_KEYWORDS: usize = 16;

/// Minimum keyword length, in characters
pub const MIN_KEYWORD_CHARS: usize = 2;

/// Delimiters splitting a plain keyword string (whitespace is always a delimiter).
pub const KEYWORD_DELIMITERS: &[char] = &[
    ',', ';', '|', '/', '／', '・', '、', '，', '；', '\u{3000}',
];

/// Generic academic terms that carry no topical signal.
pub const STOP_WORDS: &[&str] = &[
    "研究", "報告", "論文", "序", "はじめに", "まとめ", "検討", "事例", "考察", "教育", "紀要",
];

/// Delimiters used to chop a title into fallback keyword pieces.
const TITLE_DELIMITERS: &[char] = &['・', '—', '-', ':', '：', '\u{3000}'];

/// Title pieces contributed to the fallback list
const TITLE_PIECES: usize = 6;

/// One raw keyword source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Delimited string, split on [`KEYWORD_DELIMITERS`]
    Text(String),
    /// Already separated entries, only trimmed
    List(Vec<String>),
    /// Field absent upstream
    Missing,
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Candidate::Text(s.to_string())
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Candidate::Text(s)
    }
}

impl From<Vec<String>> for Candidate {
    fn from(v: Vec<String>) -> Self {
        Candidate::List(v)
    }
}

impl<T: Into<Candidate>> From<Option<T>> for Candidate {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Candidate::Missing)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || KEYWORD_DELIMITERS.contains(&c)
}

fn is_stop_word(token: &str) -> bool {
    let lower = token.to_lowercase();
    STOP_WORDS.iter().any(|w| w.to_lowercase() == lower)
}

/// Flatten, filter, deduplicate and cap keyword candidates.
///
/// Output order follows first appearance. The same input always yields the
/// same output.
pub fn normalize<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = Candidate>,
{
    let tokens = candidates.into_iter().flat_map(|c| match c {
        Candidate::Text(s) => s
            .split(is_delimiter)
            .map(str::to_string)
            .collect::<Vec<_>>(),
        Candidate::List(v) => v,
        Candidate::Missing => Vec::new(),
    });

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.chars().count() < MIN_KEYWORD_CHARS || is_stop_word(token) {
            continue;
        }
        if !seen.insert(token.to_lowercase()) {
            continue;
        }
        out.push(token.to_string());
        if out.len() >= MAX_KEYWORDS {
            break;
        }
    }

    out
}

/// Last-resort keywords from the row's tags, notes and a light split of the title.
pub fn fallback_keywords(tags: &str, notes: &str, title: &str) -> Vec<String> {
    let mut base = Vec::new();
    if !tags.is_empty() {
        base.push(Candidate::from(tags));
    }
    if !notes.is_empty() {
        base.push(Candidate::from(notes));
    }
    if !title.is_empty() {
        let pieces = title
            .split(|c: char| c.is_whitespace() || TITLE_DELIMITERS.contains(&c))
            .filter(|s| !s.is_empty())
            .take(TITLE_PIECES)
            .collect::<Vec<_>>()
            .join(",");
        base.push(Candidate::Text(pieces));
    }
    normalize(base)
}
