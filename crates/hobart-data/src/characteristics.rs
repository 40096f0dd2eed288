//! Entity characteristics.
//!
//! A small CSV keyed by entity name carrying the country and exchange codes
//! the market resolver needs.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Column names of the characteristics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteristicsConfig {
    /// Entity name column (default: "name")
    pub name_column: String,
    /// Country code column (default: "country")
    pub country_column: String,
    /// Exchange code column (default: "exchange")
    pub exchange_column: String,
}

impl Default for CharacteristicsConfig {
    fn default() -> Self {
        Self {
            name_column: "name".to_string(),
            country_column: "country".to_string(),
            exchange_column: "exchange".to_string(),
        }
    }
}

/// Country and exchange codes of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCharacteristics {
    /// Country code, if present
    pub country: Option<String>,
    /// Exchange code, if present
    pub exchange: Option<String>,
}

/// Characteristics of all entities, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Characteristics {
    entities: BTreeMap<String, EntityCharacteristics>,
}

impl Characteristics {
    /// Build from `(name, characteristics)` pairs. Later duplicates are ignored.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, EntityCharacteristics)>,
    ) -> Self {
        let mut entities = BTreeMap::new();
        for (name, chars) in entries {
            entities.entry(name).or_insert(chars);
        }
        Self { entities }
    }

    /// Read the characteristics table from a CSV file.
    pub fn from_path(path: &Path, config: &CharacteristicsConfig) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, config, &path.display().to_string())
    }

    /// Read the characteristics table from any CSV reader.
    pub fn from_reader<R: Read>(
        reader: R,
        config: &CharacteristicsConfig,
        source: &str,
    ) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| DataError::MissingColumn {
                    column: column.to_string(),
                    table: source.to_string(),
                })
        };
        let name_idx = position(&config.name_column)?;
        let country_idx = position(&config.country_column)?;
        let exchange_idx = position(&config.exchange_column)?;

        let mut entities = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let Some(name) = non_empty(record.get(name_idx)) else {
                continue;
            };
            let chars = EntityCharacteristics {
                country: non_empty(record.get(country_idx)),
                exchange: non_empty(record.get(exchange_idx)),
            };
            if entities.contains_key(&name) {
                warn!(entity = %name, source, "duplicate characteristics row ignored");
                continue;
            }
            entities.insert(name, chars);
        }

        Ok(Self { entities })
    }

    /// Look up an entity.
    pub fn get(&self, name: &str) -> Option<&EntityCharacteristics> {
        self.entities.get(name)
    }

    /// Iterate entities in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityCharacteristics)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entities are known.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
