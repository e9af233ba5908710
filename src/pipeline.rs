//! Cache build pipeline.
//!
//! Classify each row, dispatch it to its resolver, fall back to heuristic
//! keywords when the resolver found none, and write every item, in input
//! order, into one JSON array.

use crate::classify::{classify, doi_of, is_http, weko_record_url, ItemKind};
use crate::config::CacheConfig;
use crate::doi::DoiResolver;
use crate::error::Result;
use crate::http::Fetcher;
use crate::input::{read_records, InputRecord};
use crate::keywords::fallback_keywords;
use crate::metadata::{Resolution, ResolvedMetadata};
use crate::weko::WekoResolver;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Provenance tag of unresolved plain-URL rows
pub const SOURCE_URL: &str = "url";

/// One entry of the output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    pub link: String,
    pub display: String,
    /// Copied verbatim from the input row
    pub tags: String,
    /// Copied verbatim from the input row
    pub notes: String,
    pub source: String,
    pub meta: ResolvedMetadata,
    pub keywords: Vec<String>,
    pub edu: bool,
}

/// Sequential resolver pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    doi: DoiResolver,
    weko: WekoResolver,
    repo_host: String,
}

impl Pipeline {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config.user_agent)?;
        Ok(Self {
            doi: DoiResolver::from_config(config, fetcher.clone()),
            weko: WekoResolver::new(fetcher, config.edu_set_prefix.clone()),
            repo_host: config.repo_host.clone(),
        })
    }

    /// Resolve every record, strictly one after another.
    pub async fn run(&self, records: &[InputRecord]) -> Vec<OutputItem> {
        let mut out = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let item = self.process(record).await;
            info!(
                index = index,
                total = records.len(),
                source = %item.source,
                display = %item.display,
                "Processed item"
            );
            out.push(item);
        }
        out
    }

    /// Resolve one record into its output item.
    pub async fn process(&self, record: &InputRecord) -> OutputItem {
        let kind = classify(record);
        debug!(id = %record.id, url = %record.url, kind = kind.as_str(), "Classified");

        let (link, display, resolution) = match kind {
            ItemKind::Doi => {
                let doi = doi_of(record);
                let resolution = if doi.is_empty() {
                    Resolution::none()
                } else {
                    self.doi.resolve(&doi).await
                };
                let link = format!("https://doi.org/{}", urlencoding::encode(&doi));
                (link, doi, resolution)
            }
            ItemKind::Weko => {
                let abs = weko_record_url(record, &self.repo_host);
                let resolution = if abs.is_empty() {
                    Resolution::weko_fail()
                } else {
                    self.weko.resolve(&abs).await
                };
                let display = first_non_empty(&[abs.as_str(), record.url.as_str(), record.id.as_str()]);
                (abs, display, resolution)
            }
            ItemKind::Url => {
                let link = if is_http(&record.url) {
                    record.url.clone()
                } else {
                    String::new()
                };
                let resolution = Resolution {
                    source: SOURCE_URL.to_string(),
                    ..Default::default()
                };
                let display = first_non_empty(&[record.url.as_str(), record.id.as_str()]);
                (link, display, resolution)
            }
        };

        assemble(record, link, display, resolution)
    }
}

fn first_non_empty(values: &[&str]) -> String {
    values
        .iter()
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn assemble(record: &InputRecord, link: String, display: String, r: Resolution) -> OutputItem {
    let keywords = if r.keywords.is_empty() {
        fallback_keywords(&record.tags, &record.notes, &r.meta.title)
    } else {
        r.keywords
    };

    OutputItem {
        link,
        display,
        tags: record.tags.clone(),
        notes: record.notes.clone(),
        source: r.source,
        meta: r.meta,
        keywords,
        edu: r.edu,
    }
}

/// Write the artifact. The file is replaced only once fully written.
pub fn write_output(path: &Path, items: &[OutputItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read the input table, resolve every row and write the cache file.
///
/// Returns the number of items written. An unreadable input table aborts
/// before anything is written.
pub async fn build_cache(config: &CacheConfig) -> Result<usize> {
    let records = read_records(&config.input)?;
    let pipeline = Pipeline::new(config)?;
    let items = pipeline.run(&records).await;
    write_output(&config.output, &items)?;
    info!(path = %config.output.display(), items = items.len(), "Wrote cache");
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, base: &str) -> CacheConfig {
        CacheConfig {
            input: dir.path().join("items.csv"),
            output: dir.path().join("items.cache.json"),
            endpoints: Endpoints::with_base(base),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_three_rows() -> Result<()> {
        let mut server = Server::new_async().await;
        let _datacite = server
            .mock("GET", Matcher::Regex("^/dois/".to_string()))
            .with_status(200)
            .with_body(
                json!({"data": {"attributes": {
                    "titles": [{"title": "探究学習の設計"}],
                    "creators": [{"givenName": "Taro", "familyName": "Yamada"}],
                    "publicationYear": 2021,
                    "subjects": [{"subject": "探究学習"}]
                }}})
                .to_string(),
            )
            .create_async()
            .await;
        let _export = server
            .mock("GET", "/records/5/export/json")
            .with_status(200)
            .with_body(
                json!({"metadata": {
                    "item_title": "リポジトリの論文",
                    "_oai": {"sets": ["29:100"]}
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let dir = TempDir::new()?;
        let config = test_config(&dir, &server.url());
        std::fs::write(
            &config.input,
            format!(
                "id,url,type,tags,notes\n\
                 10.1000/x,,,,\n\
                 ,{}/records/5,,\"地域, 連携\",\n\
                 ,https://example.com/page,,\"防災,減災\",\"note, here\"\n",
                server.url()
            ),
        )?;

        let count = build_cache(&config).await?;
        assert_eq!(count, 3);

        let written: Vec<OutputItem> =
            serde_json::from_str(&std::fs::read_to_string(&config.output)?)?;
        assert_eq!(written.len(), 3);

        let doi = &written[0];
        assert_eq!(doi.source, "datacite");
        assert_eq!(doi.link, "https://doi.org/10.1000%2Fx");
        assert_eq!(doi.display, "10.1000/x");
        assert_eq!(doi.meta.title, "探究学習の設計");
        assert_eq!(doi.meta.authors, "Taro Yamada");
        assert_eq!(doi.keywords, vec!["探究学習"]);
        assert!(!doi.edu);

        let weko = &written[1];
        assert_eq!(weko.source, "weko-json+edu");
        assert_eq!(weko.link, format!("{}/records/5", server.url()));
        assert_eq!(weko.meta.title, "リポジトリの論文");
        assert_eq!(weko.tags, "地域, 連携");
        assert_eq!(weko.keywords, vec!["地域", "連携", "リポジトリの論文"]);
        assert!(weko.edu);

        let url = &written[2];
        assert_eq!(url.source, "url");
        assert_eq!(url.link, "https://example.com/page");
        assert_eq!(url.meta, ResolvedMetadata::default());
        assert_eq!(url.notes, "note, here");
        assert_eq!(url.keywords, vec!["防災", "減災", "note", "here"]);
        assert!(!url.edu);

        Ok(())
    }

    #[tokio::test]
    async fn test_every_item_has_meta_and_keywords_fields() -> Result<()> {
        let server = Server::new_async().await;
        let dir = TempDir::new()?;
        let config = test_config(&dir, &server.url());
        let pipeline = Pipeline::new(&config)?;

        let records = vec![
            InputRecord {
                id: "10.9999/unresolvable".to_string(),
                ..Default::default()
            },
            InputRecord {
                id: "not-a-number".to_string(),
                kind: "weko".to_string(),
                ..Default::default()
            },
        ];
        let items = pipeline.run(&records).await;

        assert_eq!(items[0].source, "none");
        assert_eq!(items[0].meta, ResolvedMetadata::default());
        assert_eq!(items[1].source, "weko-json-fail");
        assert_eq!(items[1].display, "not-a-number");

        let value = serde_json::to_value(&items)?;
        for item in value.as_array().into_iter().flatten() {
            assert!(item["meta"].is_object());
            assert!(item["keywords"].is_array());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_row_still_yields_an_item() -> Result<()> {
        let server = Server::new_async().await;
        let dir = TempDir::new()?;
        let config = test_config(&dir, &server.url());
        std::fs::write(&config.input, "id,url,type,tags,notes\n,,,,\n10.1000/x,,url,,\n")?;

        assert_eq!(build_cache(&config).await?, 2);
        let written: Vec<OutputItem> =
            serde_json::from_str(&std::fs::read_to_string(&config.output)?)?;
        assert_eq!(written[0].source, "url");
        assert_eq!(written[0].link, "");
        assert_eq!(written[0].display, "");
        assert!(written[0].keywords.is_empty());
        assert_eq!(written[1].display, "10.1000/x");
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_input_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let config = test_config(&dir, "http://127.0.0.1:9");
        assert!(build_cache(&config).await.is_err());
        assert!(!config.output.exists());
        Ok(())
    }

    #[test]
    fn test_write_output_replaces_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale")?;
        write_output(&path, &[])?;
        assert_eq!(std::fs::read_to_string(&path)?, "[]");
        Ok(())
    }
}
