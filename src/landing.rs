//! Landing-page scraping.
//!
//! Reads the Highwire `citation_*` tags, Open Graph title and `<title>`
//! element from a publisher or repository landing page.

use crate::error::{CacheError, Result};
use crate::keywords::{normalize, Candidate};
use scraper::{Html, Selector};

/// Bibliographic hints found on a landing page. Empty strings when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandingMeta {
    pub title: String,
    pub journal: String,
    pub year: String,
    pub keywords: Vec<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CacheError::Parse(e.to_string()))
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse landing-page markup.
///
/// Title priority: `citation_title`, then `og:title`, then `<title>`.
pub fn scrape(html: &str) -> Result<LandingMeta> {
    let document = Html::parse_document(html);

    let meta_content = |css: &str| -> Result<Vec<String>> {
        let sel = selector(css)?;
        Ok(document
            .select(&sel)
            .filter_map(|e| e.value().attr("content"))
            .map(collapse_ws)
            .filter(|s| !s.is_empty())
            .collect())
    };
    let first = |css: &str| -> Result<Option<String>> { Ok(meta_content(css)?.into_iter().next()) };

    let title_sel = selector("title")?;
    let title_tag = document
        .select(&title_sel)
        .next()
        .map(|e| collapse_ws(&e.text().collect::<String>()))
        .filter(|s| !s.is_empty());

    let title = first(r#"meta[name="citation_title"]"#)?
        .or(first(r#"meta[property="og:title"]"#)?)
        .or(title_tag)
        .unwrap_or_default();

    let journal = first(r#"meta[name="citation_journal_title"]"#)?.unwrap_or_default();

    let year = first(r#"meta[name="citation_publication_date"]"#)?
        .or(first(r#"meta[name="citation_date"]"#)?)
        .or(first(r#"meta[name="citation_year"]"#)?)
        .map(|d| d.chars().take(4).collect::<String>())
        .unwrap_or_default();

    let keywords = normalize(
        meta_content(r#"meta[name="citation_keywords"]"#)?
            .into_iter()
            .map(Candidate::Text),
    );

    Ok(LandingMeta {
        title,
        journal,
        year,
        keywords,
    })
}
