//! Item classification.
//!
//! Decides how each input row is resolved: DOI lookup, repository (WEKO)
//! record export, or plain URL passthrough.

use crate::input::InputRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^10\.\S+/\S+$").expect("DOI regex"));

static DOI_URL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://(dx\.)?doi\.org/").expect("DOI URL regex"));

static RECORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/records?/(\d+)").expect("record regex"));

static HTTP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("http regex"));

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("digits regex"));

/// Resolution strategy for one input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Doi,
    Weko,
    Url,
}

impl ItemKind {
    /// Parse an explicit `type` column value.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "doi" => Some(ItemKind::Doi),
            "weko" => Some(ItemKind::Weko),
            "url" => Some(ItemKind::Url),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Doi => "doi",
            ItemKind::Weko => "weko",
            ItemKind::Url => "url",
        }
    }
}

/// Remove a `https://doi.org/` (or `dx.doi.org`) prefix.
pub fn strip_doi_url(s: &str) -> &str {
    let s = s.trim();
    match DOI_URL_PREFIX_RE.find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    }
}

/// True if `s` is a DOI, bare or behind a DOI resolver URL.
pub fn is_doi(s: &str) -> bool {
    DOI_RE.is_match(strip_doi_url(s))
}

pub fn is_http(s: &str) -> bool {
    HTTP_RE.is_match(s.trim())
}

/// Numeric record id from a `/record/<n>` or `/records/<n>` path.
pub fn record_id(url: &str) -> Option<&str> {
    RECORD_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Classify a row. An explicit `type` hint always wins.
pub fn classify(record: &InputRecord) -> ItemKind {
    if !record.kind.is_empty() {
        return ItemKind::from_hint(&record.kind).unwrap_or_else(|| {
            warn!(id = %record.id, hint = %record.kind, "Unknown type hint, treating as url");
            ItemKind::Url
        });
    }

    if is_doi(&record.id) || is_doi(&record.url) {
        ItemKind::Doi
    } else if record_id(&record.url).is_some() {
        ItemKind::Weko
    } else {
        ItemKind::Url
    }
}

/// The literal DOI of a DOI-typed row.
pub fn doi_of(record: &InputRecord) -> String {
    if is_doi(&record.id) {
        strip_doi_url(&record.id).to_string()
    } else {
        strip_doi_url(&record.url).to_string()
    }
}

/// Absolute record URL of a WEKO-typed row.
///
/// Full record URLs pass through; bare numbers (in `url` or `id`) are
/// expanded against `repo_host`. Empty when no record id is present.
pub fn weko_record_url(record: &InputRecord, repo_host: &str) -> String {
    let url = record.url.trim();
    if is_http(url) && record_id(url).is_some() {
        return url.to_string();
    }

    let id = record_id(url)
        .or_else(|| DIGITS_RE.is_match(url).then_some(url))
        .or_else(|| {
            let id = record.id.trim();
            DIGITS_RE.is_match(id).then_some(id)
        });

    match id {
        Some(id) => format!("https://{}/records/{}", repo_host, id),
        None => String::new(),
    }
}
