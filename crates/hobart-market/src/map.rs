//! Country and exchange lookup tables.

use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Reserved table values with special meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentinels {
    /// "No country-level mapping, try the exchange table"
    pub no_mapping: String,
    /// "A mapping exists but there is no usable index"
    pub unusable: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            no_mapping: "NO_MAPPING".to_string(),
            unusable: "NO_INDEX".to_string(),
        }
    }
}

impl Sentinels {
    /// Create a sentinel pair.
    pub fn new(no_mapping: impl Into<String>, unusable: impl Into<String>) -> Self {
        Self {
            no_mapping: no_mapping.into(),
            unusable: unusable.into(),
        }
    }

    /// Check both sentinels are non-empty and distinct.
    pub fn validate(&self) -> Result<()> {
        let no_mapping = self.no_mapping.trim();
        let unusable = self.unusable.trim();
        if no_mapping.is_empty() {
            return Err(MarketError::EmptySentinel("no_mapping"));
        }
        if unusable.is_empty() {
            return Err(MarketError::EmptySentinel("unusable"));
        }
        if no_mapping == unusable {
            return Err(MarketError::IdenticalSentinels(no_mapping.to_string()));
        }
        Ok(())
    }
}

/// Outcome of a single table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Key maps to an index name
    Index(&'a str),
    /// Key maps to the `no_mapping` sentinel
    NoMapping,
    /// Key maps to the `unusable` sentinel
    Unusable,
    /// Key is not in the table
    Absent,
}

#[derive(Deserialize)]
struct RawMarketMap {
    no_mapping: String,
    unusable: String,
    #[serde(default)]
    country: BTreeMap<String, String>,
    #[serde(default)]
    exchange: BTreeMap<String, String>,
}

/// Immutable country→index and exchange→index tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketMap {
    #[serde(flatten)]
    sentinels: Sentinels,
    country: BTreeMap<String, String>,
    exchange: BTreeMap<String, String>,
}

impl MarketMap {
    /// Build a map; keys and values are trimmed.
    pub fn new(
        sentinels: Sentinels,
        country: impl IntoIterator<Item = (String, String)>,
        exchange: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        sentinels.validate()?;
        let sentinels = Sentinels::new(sentinels.no_mapping.trim(), sentinels.unusable.trim());
        Ok(Self {
            sentinels,
            country: normalize(country, "country"),
            exchange: normalize(exchange, "exchange"),
        })
    }

    /// Parse the JSON form `{no_mapping, unusable, country, exchange}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawMarketMap = serde_json::from_str(json)?;
        Self::new(
            Sentinels::new(raw.no_mapping, raw.unusable),
            raw.country,
            raw.exchange,
        )
    }

    /// Load the JSON form from a file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load two headed `key,index` CSV tables.
    pub fn from_csv_files(country: &Path, exchange: &Path, sentinels: Sentinels) -> Result<Self> {
        let country_rows = read_pairs(File::open(country)?, country)?;
        let exchange_rows = read_pairs(File::open(exchange)?, exchange)?;
        Self::new(sentinels, country_rows, exchange_rows)
    }

    /// Sentinels in use.
    pub const fn sentinels(&self) -> &Sentinels {
        &self.sentinels
    }

    /// Look up a country code.
    pub fn lookup_country(&self, country: &str) -> Lookup<'_> {
        self.classify(self.country.get(country.trim()))
    }

    /// Look up an exchange code.
    pub fn lookup_exchange(&self, exchange: &str) -> Lookup<'_> {
        self.classify(self.exchange.get(exchange.trim()))
    }

    /// Every real index name the tables can resolve to, sorted and deduplicated.
    pub fn index_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .country
            .values()
            .chain(self.exchange.values())
            .map(String::as_str)
            .filter(|v| !self.is_sentinel(v))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Number of `(country, exchange)` entries.
    pub fn table_sizes(&self) -> (usize, usize) {
        (self.country.len(), self.exchange.len())
    }

    fn is_sentinel(&self, value: &str) -> bool {
        value == self.sentinels.no_mapping || value == self.sentinels.unusable
    }

    fn classify<'a>(&self, value: Option<&'a String>) -> Lookup<'a> {
        match value {
            None => Lookup::Absent,
            Some(v) if *v == self.sentinels.no_mapping => Lookup::NoMapping,
            Some(v) if *v == self.sentinels.unusable => Lookup::Unusable,
            Some(v) => Lookup::Index(v),
        }
    }
}

fn normalize(
    entries: impl IntoIterator<Item = (String, String)>,
    table: &str,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (key, value) in entries {
        let key = key.trim().to_string();
        if map.contains_key(&key) {
            warn!(table, key = %key, "duplicate market map key ignored");
            continue;
        }
        map.insert(key, value.trim().to_string());
    }
    map
}

fn read_pairs<R: Read>(reader: R, path: &Path) -> Result<Vec<(String, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut pairs = Vec::new();
    for record in rdr.records() {
        let record = record?;
        match (record.get(0), record.get(1)) {
            (Some(key), Some(index)) if !key.is_empty() => {
                pairs.push((key.to_string(), index.to_string()));
            }
            (Some(""), _) => continue,
            _ => {
                return Err(MarketError::InvalidTable {
                    path: path.to_path_buf(),
                    message: format!("expected 2 columns, found {}", record.len()),
                });
            }
        }
    }
    Ok(pairs)
}
