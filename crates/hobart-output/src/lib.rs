#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{
    CsvRow, CumulativeAbnormalReturn, ExportError, ExportFormat, Exporter, FitExport,
    cumulative_by_entity,
};
pub use report::{ReportPaths, StudyReport};
pub use summary::BatchSummary;
