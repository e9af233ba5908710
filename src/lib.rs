//! # rustbibcache
//!
//! Builds the bibliographic metadata cache behind the virtual-issue pages:
//! every reference in `items.csv` (DOI, repository record or plain URL) is
//! enriched with title, authors, year, journal and keywords and written to
//! `items.cache.json`.
//!
//! ## Modules
//!
//! - [`classify`] - Decide how each row is resolved
//! - [`doi`] - DataCite / Crossref / CSL / OpenAlex fallback chain
//! - [`weko`] - WEKO repository record export
//! - [`landing`] - Landing-page title scraping
//! - [`keywords`] / [`scan`] - Keyword normalization and deep field scan
//! - [`pipeline`] - Sequential driver and artifact writer
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustbibcache::{config::CacheConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let written = pipeline::build_cache(&CacheConfig::default()).await?;
//!     println!("Wrote {} items", written);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod doi;
pub mod error;
pub mod http;
pub mod input;
pub mod keywords;
pub mod landing;
pub mod lang;
pub mod metadata;
pub mod pipeline;
pub mod scan;
pub mod value;
pub mod weko;

pub use error::{CacheError, Result};
