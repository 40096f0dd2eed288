//! Shared, read-only inputs of a study run.

use crate::config::StudySettings;
use crate::error::Result;
use hobart_data::{Characteristics, ReturnPanel};
use hobart_market::MarketMap;
use hobart_model::{MarketModel, WindowSelector};
use std::path::PathBuf;
use tracing::{info, warn};

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyInputs {
    /// Wide entity price table
    pub entities: PathBuf,
    /// Wide index price table
    pub indices: PathBuf,
    /// Entity characteristics CSV
    pub characteristics: PathBuf,
    /// Market map JSON
    pub market_map: PathBuf,
}

/// Everything an entity computation reads. Built once, never mutated.
#[derive(Debug)]
pub struct StudyContext {
    settings: StudySettings,
    entities: ReturnPanel,
    indices: ReturnPanel,
    characteristics: Characteristics,
    market_map: MarketMap,
    selector: WindowSelector,
    model: MarketModel,
}

impl StudyContext {
    /// Assemble a context from loaded inputs.
    pub fn new(
        settings: StudySettings,
        entities: ReturnPanel,
        indices: ReturnPanel,
        characteristics: Characteristics,
        market_map: MarketMap,
    ) -> Self {
        let selector =
            WindowSelector::new(settings.window, settings.return_kind).with_anchor(settings.anchor);
        let model = MarketModel::new(settings.model.clone());
        Self {
            settings,
            entities,
            indices,
            characteristics,
            market_map,
            selector,
            model,
        }
    }

    /// Load and transform every input file.
    pub fn load(settings: StudySettings, inputs: &StudyInputs) -> Result<Self> {
        let entities =
            ReturnPanel::from_path(&inputs.entities, &settings.table, &settings.entity_transform)?;
        info!(
            path = %inputs.entities.display(),
            entities = entities.len(),
            dates = entities.dates().len(),
            "loaded entity panel"
        );

        let indices =
            ReturnPanel::from_path(&inputs.indices, &settings.table, &settings.index_transform)?;
        info!(
            path = %inputs.indices.display(),
            indices = indices.len(),
            "loaded index panel"
        );

        let characteristics =
            Characteristics::from_path(&inputs.characteristics, &settings.characteristics)?;
        let market_map = MarketMap::from_json_file(&inputs.market_map)?;
        let (countries, exchanges) = market_map.table_sizes();
        info!(
            characteristics = characteristics.len(),
            countries,
            exchanges,
            "loaded characteristics and market map"
        );
        for index in market_map.index_names() {
            if indices.get(index).is_none() {
                warn!(index, "mapped index has no series in the index panel");
            }
        }

        Ok(Self::new(
            settings,
            entities,
            indices,
            characteristics,
            market_map,
        ))
    }

    /// Validated settings.
    pub const fn settings(&self) -> &StudySettings {
        &self.settings
    }

    /// Entity return panel.
    pub const fn entities(&self) -> &ReturnPanel {
        &self.entities
    }

    /// Index return panel.
    pub const fn indices(&self) -> &ReturnPanel {
        &self.indices
    }

    /// Entity characteristics.
    pub const fn characteristics(&self) -> &Characteristics {
        &self.characteristics
    }

    /// Market map.
    pub const fn market_map(&self) -> &MarketMap {
        &self.market_map
    }

    /// Window selector for the configured window.
    pub const fn selector(&self) -> &WindowSelector {
        &self.selector
    }

    /// Configured estimator.
    pub const fn model(&self) -> &MarketModel {
        &self.model
    }
}
