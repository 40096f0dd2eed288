//! Writes a complete run to an output directory.

use crate::export::{ExportError, ExportFormat, Exporter, FitExport, cumulative_by_entity};
use crate::summary::BatchSummary;
use hobart_model::{AbnormalReturnRecord, SkipRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Tables making up one study run.
#[derive(Debug, Clone, Copy)]
pub struct StudyReport<'a> {
    /// Abnormal return panel
    pub abnormal_returns: &'a [AbnormalReturnRecord],
    /// One row per fitted entity
    pub fits: &'a [FitExport],
    /// Skip log
    pub skips: &'a [SkipRecord],
    /// Run totals
    pub summary: &'a BatchSummary,
}

/// Files written by [`StudyReport::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// Abnormal return panel
    pub abnormal_returns: PathBuf,
    /// Cumulative abnormal returns per entity
    pub cumulative: PathBuf,
    /// Fits table
    pub fits: PathBuf,
    /// Skip log
    pub skips: PathBuf,
    /// Summary, always pretty JSON
    pub summary: PathBuf,
}

impl StudyReport<'_> {
    /// Write every table into `dir`, creating it if needed.
    pub fn write(&self, dir: &Path, format: ExportFormat) -> Result<ReportPaths, ExportError> {
        fs::create_dir_all(dir)?;
        let ext = format.extension();
        let paths = ReportPaths {
            abnormal_returns: dir.join(format!("abnormal_returns.{}", ext)),
            cumulative: dir.join(format!("cumulative_abnormal_returns.{}", ext)),
            fits: dir.join(format!("fits.{}", ext)),
            skips: dir.join(format!("skipped.{}", ext)),
            summary: dir.join("summary.json"),
        };

        self.abnormal_returns
            .export_to_file(&paths.abnormal_returns, format)?;
        cumulative_by_entity(self.abnormal_returns).export_to_file(&paths.cumulative, format)?;
        self.fits.export_to_file(&paths.fits, format)?;
        self.skips.export_to_file(&paths.skips, format)?;
        fs::write(&paths.summary, serde_json::to_string_pretty(self.summary)?)?;

        Ok(paths)
    }
}
