//! Category classification for feed records.
//!
//! Parsers build a feed-specific lookup key for each record (asset id plus
//! description, date plus asset id, or a fixed literal) and resolve it here.
//! The dictionary is loaded once at startup and passed explicitly to the
//! parsers; an unmapped key is not an error, it lands in the
//! [`UNCATEGORIZED`] bucket.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Sentinel category for keys absent from the dictionary.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Immutable lookup from a raw-feed classification key to a category name.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    entries: HashMap<String, String>,
}

impl CategoryMap {
    /// Build from ready-made key/category pairs.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, category)| (key.into(), category.into()))
                .collect(),
        }
    }

    /// Load from a two-column CSV file: key, category. No header row.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open category file: {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to read category file: {}", path.display()))
    }

    /// Load from any CSV source: first column key, second column category.
    ///
    /// Rows with an empty category are skipped; extra columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for record in csv_reader.records() {
            let record = record.context("Malformed CSV row in category file")?;
            let key = record.get(0).unwrap_or("").trim();
            let category = record.get(1).unwrap_or("").trim();
            if key.is_empty() || category.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), category.to_string());
        }

        Ok(Self { entries })
    }

    /// Resolve a classification key to its category name.
    ///
    /// Unmapped keys fall back to [`UNCATEGORIZED`]; missing entries are
    /// expected, not failures.
    pub fn classify(&self, key: &str) -> &str {
        self.entries
            .get(key.trim())
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
