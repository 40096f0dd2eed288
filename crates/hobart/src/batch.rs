//! Batch driver.
//!
//! Entities are independent, so the batch is a map of [`run_entity`] over the
//! entity panel followed by an order-preserving fold. The map runs on the
//! rayon pool unless disabled; output is identical either way.

use crate::context::StudyContext;
use crate::pipeline::{EntityResult, run_entity};
use hobart_data::ReturnSeries;
use hobart_model::{AbnormalReturnRecord, RegressionFit, SkipRecord};
use hobart_output::{BatchSummary, FitExport};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Batch execution options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Fan entities out over the rayon pool (default: true)
    pub parallel: bool,
    /// When set, no further entities are dispatched; in-flight ones finish
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            interrupt: None,
        }
    }
}

impl BatchOptions {
    /// Sequential execution.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Attach an interrupt flag.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Whether the interrupt flag has been raised.
    pub fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Receives per-entity outcomes as they complete.
///
/// Called from worker threads in completion order, which is not entity
/// order when running in parallel.
pub trait BatchObserver: Sync {
    /// Called once before any entity is dispatched.
    fn on_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after each entity finishes.
    fn on_outcome(&self, entity_id: &str, result: &EntityResult);

    /// Called once after the fold.
    fn on_finish(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {
    fn on_outcome(&self, _entity_id: &str, _result: &EntityResult) {}
}

/// Folded results of a batch, in entity order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Concatenated abnormal return panel
    pub records: Vec<AbnormalReturnRecord>,
    /// One fit per estimated entity
    pub fits: Vec<RegressionFit>,
    /// Skip log
    pub skips: Vec<SkipRecord>,
    /// Entities in the panel
    pub entities_total: usize,
    /// Entities never started because of an interrupt
    pub not_dispatched: usize,
}

impl BatchReport {
    /// Flat fit rows for export.
    pub fn fit_exports(&self) -> Vec<FitExport> {
        self.fits.iter().map(FitExport::from).collect()
    }

    /// Run totals.
    pub fn summary(&self, ctx: &StudyContext) -> BatchSummary {
        let window = &ctx.settings().window;
        BatchSummary::new(
            window.start,
            window.end,
            self.entities_total,
            self.fits.len(),
            &self.records,
            &self.skips,
            self.not_dispatched,
        )
    }

    fn push(&mut self, result: EntityResult) {
        match result {
            Ok(outcome) => {
                self.records.extend(outcome.records);
                self.fits.push(outcome.fit);
            }
            Err(skip) => self.skips.push(skip),
        }
    }
}

/// Run every entity of the context's panel.
///
/// Never fails: per-entity problems are in [`BatchReport::skips`].
pub fn run_batch(
    ctx: &StudyContext,
    options: &BatchOptions,
    observer: &dyn BatchObserver,
) -> BatchReport {
    let series = ctx.entities().series();
    info!(
        entities = series.len(),
        parallel = options.parallel,
        window_start = %ctx.settings().window.start,
        window_end = %ctx.settings().window.end,
        "starting batch"
    );
    observer.on_start(series.len());

    let dispatch = |entity: &ReturnSeries| -> Option<EntityResult> {
        if options.interrupted() {
            return None;
        }
        let result = run_entity(ctx, entity);
        observer.on_outcome(entity.name(), &result);
        Some(result)
    };

    let results: Vec<Option<EntityResult>> = if options.parallel {
        series.par_iter().map(dispatch).collect()
    } else {
        series.iter().map(dispatch).collect()
    };

    let mut report = BatchReport {
        entities_total: series.len(),
        ..Default::default()
    };
    for result in results {
        match result {
            Some(result) => report.push(result),
            None => report.not_dispatched += 1,
        }
    }

    if report.not_dispatched > 0 {
        warn!(
            not_dispatched = report.not_dispatched,
            "batch interrupted"
        );
    }
    info!(
        fitted = report.fits.len(),
        skipped = report.skips.len(),
        rows = report.records.len(),
        "batch finished"
    );
    observer.on_finish(&report);

    report
}
