//! WEKO repository record resolver.
//!
//! Fetches `<origin>/records/<id>/export/json` and digs title, authors,
//! year, journal, keywords and education-collection membership out of the
//! repository's item schema. Field names vary between repository
//! configurations, so every lookup has a fallback.

use crate::classify::record_id;
use crate::error::{CacheError, Result};
use crate::http::{Fetcher, ACCEPT_JSON};
use crate::keywords::{normalize, Candidate};
use crate::lang::is_preferred_lang;
use crate::metadata::{Resolution, ResolvedMetadata};
use crate::scan::scan;
use crate::value::{candidate, first_text, items, text, year_prefix};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// Provenance tag of a successful record export
pub const SOURCE_WEKO: &str = "weko-json";

/// Suffix appended to the provenance of education-collection records
pub const EDU_SUFFIX: &str = "+edu";

/// Bibliographic block of the default item type
const BIBLIO_KEY: &str = "item_10002_biblio_info_7";

/// Fields that may carry a title entry's language tag.
const TITLE_LANG_FIELDS: &[&str] = &["subitem_title_language", "language", "lang", "xml:lang"];

/// Repository record resolver.
#[derive(Debug, Clone)]
pub struct WekoResolver {
    fetcher: Fetcher,
    edu_set_prefix: String,
}

impl WekoResolver {
    pub fn new(fetcher: Fetcher, edu_set_prefix: impl Into<String>) -> Self {
        Self {
            fetcher,
            edu_set_prefix: edu_set_prefix.into(),
        }
    }

    /// Resolve an absolute record URL.
    ///
    /// Never fails: an unusable reference or an unreachable export yields
    /// the `weko-json-fail` sentinel.
    pub async fn resolve(&self, record_url: &str) -> Resolution {
        match self.try_resolve(record_url).await {
            Ok(resolution) => {
                info!(url = record_url, source = %resolution.source, "Resolved repository record");
                resolution
            }
            Err(e) => {
                warn!(url = record_url, error = %e, "Repository record lookup failed");
                Resolution::weko_fail()
            }
        }
    }

    async fn try_resolve(&self, record_url: &str) -> Result<Resolution> {
        let api = export_url(record_url)?;
        debug!(api = %api, "Fetching record export");
        let doc = self.fetcher.get_json(&api, ACCEPT_JSON).await?;
        Ok(shape_record(&doc, &self.edu_set_prefix))
    }
}

/// JSON export URL on the same host as `record_url`.
pub fn export_url(record_url: &str) -> Result<String> {
    let id = record_id(record_url)
        .ok_or_else(|| CacheError::InvalidRecord(format!("no record id in '{}'", record_url)))?;
    let parsed = Url::parse(record_url)
        .map_err(|e| CacheError::InvalidRecord(format!("'{}': {}", record_url, e)))?;
    Ok(format!(
        "{}/records/{}/export/json",
        parsed.origin().ascii_serialization(),
        id
    ))
}

/// Map a record export document onto a [`Resolution`].
pub fn shape_record(doc: &Value, edu_set_prefix: &str) -> Resolution {
    let empty = Value::Null;
    let md = doc.get("metadata").unwrap_or(&empty);

    let meta = ResolvedMetadata {
        title: select_title(doc, md),
        authors: collect_authors(md),
        year: bibliographic_year(md),
        journal: bibliographic_journal(md),
    };

    let keywords = collect_keywords(doc, md);
    let edu = in_edu_collection(doc, md, edu_set_prefix);

    let source = if edu {
        format!("{}{}", SOURCE_WEKO, EDU_SUFFIX)
    } else {
        SOURCE_WEKO.to_string()
    };

    Resolution {
        source,
        meta,
        keywords,
        edu,
    }
}

// === Title ===

fn title_entries(md: &Value) -> &[Value] {
    let primary = items(md.pointer("/item_titles/attribute_value_mlt"));
    if !primary.is_empty() {
        return primary;
    }

    // Item types with numbered keys keep the title list elsewhere.
    md.as_object()
        .into_iter()
        .flat_map(|m| m.values())
        .map(|v| items(v.get("attribute_value_mlt")))
        .find(|entries| entries.iter().any(|e| e.get("subitem_title").is_some()))
        .unwrap_or(&[])
}

fn entry_title(entry: &Value) -> Option<String> {
    text(entry.get("subitem_title"))
}

fn entry_lang(entry: &Value) -> Option<String> {
    TITLE_LANG_FIELDS.iter().find_map(|f| text(entry.get(*f)))
}

/// First non-empty of: flat title, preferred-language entry, untagged
/// entry, first entry, top-level title, generic metadata title.
fn select_title(doc: &Value, md: &Value) -> String {
    let entries = title_entries(md);

    first_text(md.get("item_title"))
        .or_else(|| {
            entries
                .iter()
                .filter(|e| entry_lang(e).is_some_and(|l| is_preferred_lang(&l)))
                .find_map(entry_title)
        })
        .or_else(|| {
            entries
                .iter()
                .filter(|e| entry_lang(e).is_none())
                .find_map(entry_title)
        })
        .or_else(|| entries.first().and_then(entry_title))
        .or_else(|| first_text(doc.get("title")))
        .or_else(|| first_text(md.get("title")))
        .unwrap_or_default()
}

// === Authors ===

fn creator_entries(md: &Value) -> &[Value] {
    let primary = items(md.pointer("/item_creator/attribute_value_mlt"));
    if !primary.is_empty() {
        return primary;
    }
    let flat = items(md.get("creators"));
    if !flat.is_empty() {
        return flat;
    }
    md.as_object()
        .into_iter()
        .flat_map(|m| m.values())
        .map(|v| items(v.get("attribute_value_mlt")))
        .find(|entries| entries.iter().any(|e| e.get("creatorNames").is_some()))
        .unwrap_or(&[])
}

fn collect_authors(md: &Value) -> String {
    let mut names = Vec::new();
    for creator in creator_entries(md) {
        if let Some(list) = creator.get("creatorNames").and_then(Value::as_array) {
            names.extend(list.iter().filter_map(|n| text(n.get("creatorName"))));
        } else if let Some(name) = text(creator.get("creatorName")) {
            names.push(name);
        } else if let Some(name) = text(creator.get("name")) {
            names.push(name);
        }
    }
    names.join(", ")
}

// === Year / journal ===

fn biblio_entry(md: &Value) -> Option<&Value> {
    md.pointer(&format!("/{}/attribute_value_mlt/0", BIBLIO_KEY))
        .or_else(|| {
            md.as_object()?
                .iter()
                .filter(|(k, _)| k.contains("biblio_info"))
                .find_map(|(_, v)| v.pointer("/attribute_value_mlt/0"))
        })
}

fn bibliographic_year(md: &Value) -> String {
    let bib = biblio_entry(md);
    bib.and_then(|b| year_prefix(b.pointer("/bibliographicIssueDates/bibliographicIssueDate")))
        .or_else(|| year_prefix(md.get("publish_date")))
        .or_else(|| year_prefix(md.pointer("/pubdate/attribute_value")))
        .unwrap_or_default()
}

fn bibliographic_journal(md: &Value) -> String {
    biblio_entry(md)
        .map(|b| items(b.get("bibliographic_titles")))
        .unwrap_or(&[])
        .iter()
        .find_map(|t| text(t.get("bibliographic_title")))
        .unwrap_or_default()
}

// === Keywords ===

fn entry_field_list(md: &Value, key: &str, field: &str) -> Candidate {
    Candidate::List(
        items(md.pointer(&format!("/{}/attribute_value_mlt", key)))
            .iter()
            .filter_map(|e| text(e.get(field)))
            .collect(),
    )
}

fn collect_keywords(doc: &Value, md: &Value) -> Vec<String> {
    let candidates = vec![
        entry_field_list(md, "item_keywords", "subitem_keyword"),
        entry_field_list(md, "item_keyword", "subitem_keyword"),
        entry_field_list(md, "item_subject", "subitem_subject"),
        candidate(md.get("keywords")),
        candidate(md.get("keyword")),
        candidate(md.get("subject")),
        candidate(doc.get("keywords")),
        candidate(doc.get("subject")),
        Candidate::List(scan(md)),
    ];
    normalize(candidates)
}

// === Education index ===

fn in_edu_collection(doc: &Value, md: &Value, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let sets = md
        .pointer("/_oai/sets")
        .or_else(|| doc.pointer("/_oai/sets"));
    items(sets)
        .iter()
        .filter_map(Value::as_str)
        .any(|s| s.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    fn sample_record() -> Value {
        json!({
            "id": 1234,
            "metadata": {
                "item_titles": {
                    "attribute_value_mlt": [
                        {"subitem_title": "A Study of Classroom Practice", "subitem_title_language": "en"},
                        {"subitem_title": "授業実践の研究", "subitem_title_language": "ja"}
                    ]
                },
                "item_creator": {
                    "attribute_value_mlt": [
                        {"creatorNames": [{"creatorName": "山田, 太郎"}, {"creatorName": ""}]},
                        {"creatorName": "佐藤 花子"},
                        {"name": "Suzuki Jiro"}
                    ]
                },
                "item_10002_biblio_info_7": {
                    "attribute_value_mlt": [{
                        "bibliographicIssueDates": {"bibliographicIssueDate": "2021-03-31"},
                        "bibliographic_titles": [{"bibliographic_title": "北陸学院大学研究紀要"}]
                    }]
                },
                "item_keyword": {
                    "attribute_value_mlt": [{"subitem_keyword": "授業研究"}, {"subitem_keyword": "協働学習"}]
                },
                "item_1617186609386": {
                    "attribute_value_mlt": [{"subitem_subject": "教育工学", "subitem_subject_language": "ja"}]
                },
                "_oai": {"sets": ["1580000000000", "29:1616000000000"]}
            }
        })
    }

    #[test]
    fn test_shape_full_record() {
        let r = shape_record(&sample_record(), "29");
        assert_eq!(r.source, "weko-json+edu");
        assert!(r.edu);
        assert_eq!(r.meta.title, "授業実践の研究");
        assert_eq!(r.meta.authors, "山田, 太郎, 佐藤 花子, Suzuki Jiro");
        assert_eq!(r.meta.year, "2021");
        assert_eq!(r.meta.journal, "北陸学院大学研究紀要");
        assert_eq!(r.keywords, vec!["授業研究", "協働学習", "教育工学", "ja"]);
    }

    #[test]
    fn test_flat_title_wins() {
        let doc = json!({"metadata": {
            "item_title": "Flat title",
            "item_titles": {"attribute_value_mlt": [{"subitem_title": "日本語", "subitem_title_language": "ja"}]}
        }});
        assert_eq!(shape_record(&doc, "29").meta.title, "Flat title");
    }

    #[test]
    fn test_untagged_title_beats_english() {
        let doc = json!({"metadata": {
            "item_titles": {"attribute_value_mlt": [
                {"subitem_title": "English title", "subitem_title_language": "en"},
                {"subitem_title": "言語タグなし"}
            ]}
        }});
        assert_eq!(shape_record(&doc, "29").meta.title, "言語タグなし");
    }

    #[test]
    fn test_title_fallbacks() {
        let first_entry = json!({"metadata": {
            "item_titles": {"attribute_value_mlt": [
                {"subitem_title": "First", "subitem_title_language": "en"},
                {"subitem_title": "Second", "subitem_title_language": "de"}
            ]}
        }});
        assert_eq!(shape_record(&first_entry, "29").meta.title, "First");

        let top_level = json!({"title": ["Top"], "metadata": {"title": "Generic"}});
        assert_eq!(shape_record(&top_level, "29").meta.title, "Top");

        let generic = json!({"metadata": {"title": "Generic"}});
        assert_eq!(shape_record(&generic, "29").meta.title, "Generic");
    }

    #[test]
    fn test_numbered_title_list() {
        let doc = json!({"metadata": {
            "item_30002_title0": {"attribute_value_mlt": [
                {"subitem_title": "Numbered", "subitem_title_language": "en"},
                {"subitem_title": "番号付き", "subitem_title_language": "ja"}
            ]}
        }});
        assert_eq!(shape_record(&doc, "29").meta.title, "番号付き");
    }

    #[test]
    fn test_year_fallbacks() {
        let publish = json!({"metadata": {"publish_date": "2018-07-01"}});
        assert_eq!(shape_record(&publish, "29").meta.year, "2018");

        let pubdate = json!({"metadata": {"pubdate": {"attribute_value": "2017-01-01"}}});
        assert_eq!(shape_record(&pubdate, "29").meta.year, "2017");

        let other_biblio = json!({"metadata": {"item_30002_biblio_info9": {"attribute_value_mlt": [{
            "bibliographicIssueDates": {"bibliographicIssueDate": "2016"},
            "bibliographic_titles": [{"bibliographic_title": "Bulletin"}]
        }]}}});
        let r = shape_record(&other_biblio, "29");
        assert_eq!(r.meta.year, "2016");
        assert_eq!(r.meta.journal, "Bulletin");
    }

    #[test]
    fn test_flat_creators_and_top_level_sets() {
        let doc = json!({
            "_oai": {"sets": ["29"]},
            "metadata": {"creators": [{"name": "Tanaka"}, {"creatorName": "Ito"}]}
        });
        let r = shape_record(&doc, "29");
        assert_eq!(r.meta.authors, "Tanaka, Ito");
        assert!(r.edu);
    }

    #[test]
    fn test_not_edu() {
        let doc = json!({"metadata": {"_oai": {"sets": ["1", "3029"]}}});
        let r = shape_record(&doc, "29");
        assert!(!r.edu);
        assert_eq!(r.source, "weko-json");
    }

    #[test]
    fn test_empty_document() {
        let r = shape_record(&json!({}), "29");
        assert_eq!(r.source, "weko-json");
        assert_eq!(r.meta, ResolvedMetadata::default());
        assert!(r.keywords.is_empty());
    }

    #[test]
    fn test_export_url() {
        assert_eq!(
            export_url("https://repo.example.jp/records/42?tab=1").expect("url"),
            "https://repo.example.jp/records/42/export/json"
        );
        assert!(matches!(
            export_url("https://repo.example.jp/about"),
            Err(CacheError::InvalidRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_fetches_export() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/records/1234/export/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(sample_record().to_string())
            .create_async()
            .await;

        let resolver = WekoResolver::new(Fetcher::new("test").expect("client"), "29");
        let r = resolver
            .resolve(&format!("{}/records/1234", server.url()))
            .await;
        assert_eq!(r.meta.title, "授業実践の研究");
        assert!(r.edu);
    }

    #[tokio::test]
    async fn test_resolve_failures_yield_sentinel() {
        let server = Server::new_async().await;
        let resolver = WekoResolver::new(Fetcher::new("test").expect("client"), "29");

        let no_id = resolver.resolve("https://repo.example.jp/about").await;
        assert_eq!(no_id, Resolution::weko_fail());

        let unreachable = resolver
            .resolve(&format!("{}/records/9", server.url()))
            .await;
        assert_eq!(unreachable.source, "weko-json-fail");
        assert!(!unreachable.edu);
    }
}
