//! Per-entity pipeline: resolve, window, fit, project.

use crate::context::StudyContext;
use hobart_data::ReturnSeries;
use hobart_market::MarketResolver;
use hobart_model::{
    AbnormalReturnRecord, ModelError, RegressionFit, SkipReason, SkipRecord, project,
};
use tracing::{debug, warn};

/// A successfully estimated entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOutcome {
    /// Entity name
    pub entity_id: String,
    /// Fitted market model
    pub fit: RegressionFit,
    /// Prediction-window rows, in date order
    pub records: Vec<AbnormalReturnRecord>,
}

/// Outcome of one entity: estimated, or skipped with a reason.
pub type EntityResult = Result<EntityOutcome, SkipRecord>;

/// Run the full pipeline for one entity.
///
/// Pure with respect to `ctx`: reads only shared inputs and this entity's
/// series. Every failure becomes a [`SkipRecord`].
pub fn run_entity(ctx: &StudyContext, entity: &ReturnSeries) -> EntityResult {
    let entity_id = entity.name();
    let window = &ctx.settings().window;
    let skip = |reason: SkipReason, detail: String| {
        warn!(entity = entity_id, %reason, detail = %detail, "entity skipped");
        SkipRecord::new(entity_id, reason, window, detail)
    };

    let chars = ctx.characteristics().get(entity_id);
    let country = chars.and_then(|c| c.country.as_deref());
    let exchange = chars.and_then(|c| c.exchange.as_deref());

    let resolution = MarketResolver::new(ctx.market_map())
        .resolve(country, exchange)
        .map_err(|e| skip(SkipReason::MissingIndexMapping, e.to_string()))?;

    let index = ctx.indices().get(&resolution.index).ok_or_else(|| {
        skip(
            SkipReason::MissingIndexMapping,
            format!(
                "index {:?} (via {}) is not in the index panel",
                resolution.index, resolution.via
            ),
        )
    })?;

    let model_skip = |e: ModelError| {
        let reason = e.skip_reason().unwrap_or(SkipReason::RegressionFailure);
        skip(reason, e.to_string())
    };

    let slices = ctx.selector().select(entity, index).map_err(model_skip)?;
    let fit = ctx
        .model()
        .fit(entity_id, &slices.estimation)
        .map_err(model_skip)?;
    let records = project(&fit, &slices.prediction);

    debug!(
        entity = entity_id,
        index = %fit.index_name,
        alpha = fit.intercept,
        beta = fit.slope,
        n = fit.n_observations,
        rows = records.len(),
        "entity fitted"
    );

    Ok(EntityOutcome {
        entity_id: entity_id.to_string(),
        fit,
        records,
    })
}
