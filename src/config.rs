//! Run configuration.
//!
//! Defaults reproduce the fixed layout of the virtual-issue docs folder:
//! `items.csv` in, `items.cache.json` out, one institutional repository.

use std::path::PathBuf;

/// Default input table
pub const DEFAULT_INPUT: &str = "items.csv";

/// Default output artifact
pub const DEFAULT_OUTPUT: &str = "items.cache.json";

/// Repository host used to expand bare record ids
pub const DEFAULT_REPO_HOST: &str = "hokuriku.repo.nii.ac.jp";

/// OAI set-code prefix of the education collection
pub const DEFAULT_EDU_SET_PREFIX: &str = "29";

/// User agent sent to every upstream service
const USER_AGENT: &str = "rustbibcache/0.1 (virtual-issue metadata cache)";

/// Base URLs of the DOI metadata services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// DataCite DOIs API (`{datacite}/{doi}`)
    pub datacite: String,
    /// Crossref works API (`{crossref}/{doi}`)
    pub crossref: String,
    /// DOI resolver, used for CSL content negotiation and landing pages
    pub doi_org: String,
    /// OpenAlex works API (`{openalex}/https://doi.org/{doi}`)
    pub openalex: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            datacite: "https://api.datacite.org/dois".to_string(),
            crossref: "https://api.crossref.org/works".to_string(),
            doi_org: "https://doi.org".to_string(),
            openalex: "https://api.openalex.org/works".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (mock servers).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            datacite: format!("{}/dois", base),
            crossref: format!("{}/works", base),
            doi_org: base.to_string(),
            openalex: format!("{}/openalex/works", base),
        }
    }
}

/// Settings for one cache build.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Host used when a WEKO row carries only a record number
    pub repo_host: String,
    /// Hosts whose landing pages are re-resolved through the WEKO export
    pub repo_hosts: Vec<String>,
    pub edu_set_prefix: String,
    pub user_agent: String,
    pub endpoints: Endpoints,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            repo_host: DEFAULT_REPO_HOST.to_string(),
            repo_hosts: vec![DEFAULT_REPO_HOST.to_string()],
            edu_set_prefix: DEFAULT_EDU_SET_PREFIX.to_string(),
            user_agent: USER_AGENT.to_string(),
            endpoints: Endpoints::default(),
        }
    }
}
