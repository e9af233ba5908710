//! DOI metadata resolver.
//!
//! Tries DataCite, Crossref, doi.org content negotiation (CSL-JSON) and
//! OpenAlex in that order; the first source that answers and maps cleanly
//! wins. A second pass visits the DOI landing page to pick up a Japanese
//! title when the winning source only had a romanized or English one.
//!
//! API notes:
//! - Every source is tried once, no retry.
//! - Source failures are logged at debug level and otherwise ignored.

use crate::classify::record_id;
use crate::config::{CacheConfig, Endpoints};
use crate::error::{OptionExt, Result};
use crate::http::{Fetcher, ACCEPT_CSL_JSON, ACCEPT_JSON};
use crate::keywords::{normalize, Candidate};
use crate::landing::{scrape, LandingMeta};
use crate::lang::has_japanese;
use crate::metadata::{Resolution, ResolvedMetadata, SOURCE_NONE, SOURCE_WEKO_FAIL};
use crate::value::{candidate, first_text, items, text, year_prefix};
use crate::weko::WekoResolver;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const SOURCE_DATACITE: &str = "datacite";
pub const SOURCE_CROSSREF: &str = "crossref";
pub const SOURCE_DOI_CSL: &str = "doi.org-csl";
pub const SOURCE_OPENALEX: &str = "openalex";

/// Suffix appended to the provenance when the landing pass changed the title
pub const LANDING_SUFFIX: &str = "+landing";

/// OpenAlex concepts kept as keyword candidates
const MAX_OPENALEX_CONCEPTS: usize = 12;

/// Metadata mapped out of one source's response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shaped {
    pub meta: ResolvedMetadata,
    pub keywords: Vec<String>,
}

type ShapeFn = fn(&Value) -> Result<Shaped>;

/// One step of the fallback chain.
pub struct DoiSource {
    pub name: &'static str,
    pub url: String,
    pub accept: &'static str,
    shape: ShapeFn,
}

/// The fallback chain for `doi`, in the order it is tried.
pub fn doi_sources(endpoints: &Endpoints, doi: &str) -> Vec<DoiSource> {
    let encoded = urlencoding::encode(doi);
    vec![
        DoiSource {
            name: SOURCE_DATACITE,
            url: format!("{}/{}", endpoints.datacite, encoded),
            accept: ACCEPT_JSON,
            shape: shape_datacite,
        },
        DoiSource {
            name: SOURCE_CROSSREF,
            url: format!("{}/{}", endpoints.crossref, encoded),
            accept: ACCEPT_JSON,
            shape: shape_crossref,
        },
        DoiSource {
            name: SOURCE_DOI_CSL,
            url: format!("{}/{}", endpoints.doi_org, encoded),
            accept: ACCEPT_CSL_JSON,
            shape: shape_csl,
        },
        DoiSource {
            name: SOURCE_OPENALEX,
            url: format!("{}/https://doi.org/{}", endpoints.openalex, encoded),
            accept: ACCEPT_JSON,
            shape: shape_openalex,
        },
    ]
}

/// What the landing page contributes to a DOI resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandingPatch {
    pub title: String,
    pub journal: String,
    pub year: String,
    pub keywords: Vec<String>,
    pub edu: bool,
    /// Title came from a repository record and replaces the primary one as is
    pub authoritative: bool,
}

impl LandingPatch {
    fn from_repository(r: Resolution) -> Self {
        Self {
            title: r.meta.title,
            journal: r.meta.journal,
            year: r.meta.year,
            keywords: r.keywords,
            edu: r.edu,
            authoritative: true,
        }
    }

    fn from_page(m: LandingMeta) -> Self {
        Self {
            title: m.title,
            journal: m.journal,
            year: m.year,
            keywords: m.keywords,
            edu: false,
            authoritative: false,
        }
    }

    fn replaces_title(&self) -> bool {
        !self.title.is_empty() && (self.authoritative || has_japanese(&self.title))
    }
}

/// Apply a landing patch to a primary resolution.
///
/// When the patch qualifies, the title is overwritten unconditionally;
/// journal, year and keywords are only filled where the primary is empty.
/// Authors are never touched.
pub fn merge_landing(mut primary: Resolution, patch: LandingPatch) -> Resolution {
    if !patch.replaces_title() {
        return primary;
    }

    primary.meta.title = patch.title;
    if primary.meta.journal.is_empty() {
        primary.meta.journal = patch.journal;
    }
    if primary.meta.year.is_empty() {
        primary.meta.year = patch.year;
    }
    if primary.keywords.is_empty() {
        primary.keywords = patch.keywords;
    }
    primary.edu |= patch.edu;
    primary.source.push_str(LANDING_SUFFIX);
    primary
}

/// DOI resolver over the fallback chain plus the landing-page pass.
#[derive(Debug, Clone)]
pub struct DoiResolver {
    fetcher: Fetcher,
    endpoints: Endpoints,
    repo_hosts: Vec<String>,
    weko: WekoResolver,
}

impl DoiResolver {
    pub fn new(
        fetcher: Fetcher,
        endpoints: Endpoints,
        repo_hosts: Vec<String>,
        weko: WekoResolver,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            repo_hosts,
            weko,
        }
    }

    pub fn from_config(config: &CacheConfig, fetcher: Fetcher) -> Self {
        let weko = WekoResolver::new(fetcher.clone(), config.edu_set_prefix.clone());
        Self::new(
            fetcher,
            config.endpoints.clone(),
            config.repo_hosts.clone(),
            weko,
        )
    }

    /// Resolve `doi`. Never fails; see [`Resolution::none`].
    pub async fn resolve(&self, doi: &str) -> Resolution {
        let primary = self.resolve_primary(doi).await;
        if primary.source == SOURCE_NONE || has_japanese(&primary.meta.title) {
            return primary;
        }

        match self.landing_patch(doi).await {
            Ok(patch) => {
                let merged = merge_landing(primary, patch);
                if merged.source.ends_with(LANDING_SUFFIX) {
                    info!(doi = doi, title = %merged.meta.title, "Preferred landing-page title");
                }
                merged
            }
            Err(e) => {
                debug!(doi = doi, error = %e, "Landing page unavailable");
                primary
            }
        }
    }

    /// First source of the chain that succeeds.
    pub async fn resolve_primary(&self, doi: &str) -> Resolution {
        for source in doi_sources(&self.endpoints, doi) {
            match self.try_source(&source).await {
                Ok(shaped) => {
                    info!(doi = doi, source = source.name, "Resolved DOI");
                    return Resolution {
                        source: source.name.to_string(),
                        meta: shaped.meta,
                        keywords: shaped.keywords,
                        edu: false,
                    };
                }
                Err(e) => {
                    debug!(doi = doi, source = source.name, error = %e, "Source failed");
                }
            }
        }

        warn!(doi = doi, "All DOI sources failed");
        Resolution::none()
    }

    async fn try_source(&self, source: &DoiSource) -> Result<Shaped> {
        let body = self.fetcher.get_json(&source.url, source.accept).await?;
        (source.shape)(&body)
    }

    fn is_repo_host(&self, host: &str) -> bool {
        self.repo_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    async fn landing_patch(&self, doi: &str) -> Result<LandingPatch> {
        let url = format!("{}/{}", self.endpoints.doi_org, urlencoding::encode(doi));
        let page = self.fetcher.get_page(&url).await?;

        let on_repository = page.url.host_str().is_some_and(|h| self.is_repo_host(h))
            && record_id(page.url.path()).is_some();

        if on_repository {
            debug!(doi = doi, url = %page.url, "Landing page is a repository record");
            let record = self.weko.resolve(page.url.as_str()).await;
            if record.source != SOURCE_WEKO_FAIL {
                return Ok(LandingPatch::from_repository(record));
            }
        }

        Ok(LandingPatch::from_page(scrape(&page.body)?))
    }
}

// === Source shapes ===

fn person_name(p: &Value, given: &str, family: &str) -> Option<String> {
    let parts: Vec<String> = [text(p.get(given)), text(p.get(family))]
        .into_iter()
        .flatten()
        .collect();
    if !parts.is_empty() {
        return Some(parts.join(" "));
    }
    text(p.get("name")).or_else(|| text(p.get("literal")))
}

fn join_people(people: &[Value], given: &str, family: &str) -> String {
    people
        .iter()
        .filter_map(|p| person_name(p, given, family))
        .collect::<Vec<_>>()
        .join(", ")
}

fn date_parts_year(v: &Value, field: &str) -> Option<String> {
    text(v.pointer(&format!("/{}/date-parts/0/0", field)))
}

fn require_object<'a>(v: Option<&'a Value>, what: &str) -> Result<&'a Value> {
    v.filter(|v| v.is_object()).ok_or_shape(what)
}

/// DataCite `GET /dois/{doi}`.
///
/// A body without a `data.attributes` object is a shape failure, so the
/// chain moves on instead of accepting an empty record.
pub fn shape_datacite(body: &Value) -> Result<Shaped> {
    let a = require_object(body.pointer("/data/attributes"), "DataCite: missing data.attributes")?;

    let title = items(a.get("titles"))
        .iter()
        .find_map(|t| text(t.get("title")))
        .unwrap_or_default();

    let creators = items(a.get("creators"));
    let people = if creators.is_empty() {
        items(a.get("contributors"))
    } else {
        creators
    };

    let journal = text(a.pointer("/container/title"))
        .or_else(|| text(a.get("publisher")))
        .or_else(|| text(a.pointer("/publisher/name")))
        .unwrap_or_default();

    let subjects = items(a.get("subjects"))
        .iter()
        .filter_map(|s| text(s.get("subject")))
        .collect::<Vec<_>>();

    Ok(Shaped {
        meta: ResolvedMetadata {
            title,
            authors: join_people(people, "givenName", "familyName"),
            year: text(a.get("publicationYear")).unwrap_or_default(),
            journal,
        },
        keywords: normalize(vec![Candidate::List(subjects)]),
    })
}

/// Crossref `GET /works/{doi}`.
///
/// A body without a `message` object is a shape failure, like DataCite's
/// missing `data.attributes`.
pub fn shape_crossref(body: &Value) -> Result<Shaped> {
    let m = require_object(body.get("message"), "Crossref: missing message")?;

    let year = ["issued", "published", "published-print", "published-online"]
        .iter()
        .find_map(|f| date_parts_year(m, f))
        .unwrap_or_default();

    Ok(Shaped {
        meta: ResolvedMetadata {
            title: first_text(m.get("title")).unwrap_or_default(),
            authors: join_people(items(m.get("author")), "given", "family"),
            year,
            journal: first_text(m.get("container-title")).unwrap_or_default(),
        },
        keywords: normalize(vec![candidate(m.get("subject"))]),
    })
}

/// CSL-JSON from doi.org content negotiation.
pub fn shape_csl(body: &Value) -> Result<Shaped> {
    let j = require_object(Some(body), "CSL: body is not an object")?;

    let journal = first_text(j.get("container-title"))
        .or_else(|| first_text(j.get("container-title-short")))
        .unwrap_or_default();

    let keywords = ["keyword", "keywords", "categories"]
        .iter()
        .map(|f| candidate(j.get(*f)))
        .find(|c| *c != Candidate::Missing)
        .unwrap_or(Candidate::Missing);

    Ok(Shaped {
        meta: ResolvedMetadata {
            title: first_text(j.get("title")).unwrap_or_default(),
            authors: join_people(items(j.get("author")), "given", "family"),
            year: date_parts_year(j, "issued").unwrap_or_default(),
            journal,
        },
        keywords: normalize(vec![keywords]),
    })
}

/// OpenAlex `GET /works/https://doi.org/{doi}`.
pub fn shape_openalex(body: &Value) -> Result<Shaped> {
    let j = require_object(Some(body), "OpenAlex: body is not an object")?;

    let title = text(j.get("title"))
        .or_else(|| text(j.get("display_name")))
        .unwrap_or_default();

    let year = text(j.get("publication_year"))
        .or_else(|| year_prefix(j.get("from_publication_date")))
        .or_else(|| year_prefix(j.get("publication_date")))
        .unwrap_or_default();

    let authors = items(j.get("authorships"))
        .iter()
        .filter_map(|a| text(a.pointer("/author/display_name")))
        .collect::<Vec<_>>()
        .join(", ");

    let journal = text(j.pointer("/host_venue/display_name"))
        .or_else(|| text(j.pointer("/primary_location/source/display_name")))
        .unwrap_or_default();

    let display_names = |field: &str, limit: usize| {
        items(j.get(field))
            .iter()
            .filter_map(|c| text(c.get("display_name")))
            .take(limit)
            .collect::<Vec<_>>()
    };
    let mut terms = display_names("concepts", MAX_OPENALEX_CONCEPTS);
    if terms.is_empty() {
        terms = display_names("keywords", usize::MAX);
    }

    Ok(Shaped {
        meta: ResolvedMetadata {
            title,
            authors,
            year,
            journal,
        },
        keywords: normalize(vec![Candidate::List(terms)]),
    })
}
