//! Input table reader.
//!
//! Columns `id, url, type, tags, notes`, header matched case-insensitively.
//! Missing columns read as empty strings. Every data row becomes a record,
//! even one whose fields are all empty; only truly empty lines are skipped.

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// One row of the input table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    pub id: String,
    pub url: String,
    /// Optional resolution hint from the `type` column (`doi`, `weko`, `url`), lowercased
    pub kind: String,
    pub tags: String,
    pub notes: String,
}

/// Read and parse the input table at `path`.
pub fn read_records(path: &Path) -> Result<Vec<InputRecord>> {
    let text = std::fs::read_to_string(path)?;
    let records = parse_records(&text)?;
    info!(path = %path.display(), rows = records.len(), "Loaded input table");
    Ok(records)
}

/// Parse an input table held in memory.
pub fn parse_records(text: &str) -> Result<Vec<InputRecord>> {
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let field = |name: &str| {
            columns
                .get(name)
                .and_then(|&i| row.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        records.push(InputRecord {
            id: field("id"),
            url: field("url"),
            kind: field("type").to_lowercase(),
            tags: field("tags"),
            notes: field("notes"),
        });
    }

    Ok(records)
}
