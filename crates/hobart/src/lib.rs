#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use hobart_data as data;
pub use hobart_market as market;
pub use hobart_model as model;
pub use hobart_output as output;

pub use batch::{BatchObserver, BatchOptions, BatchReport, NoopObserver, run_batch};
pub use config::{ConfigError, StudyConfig, StudySettings};
pub use context::{StudyContext, StudyInputs};
pub use error::{Error, Result};
pub use pipeline::{EntityOutcome, EntityResult, run_entity};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
