#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod map;
pub mod resolver;

pub use error::{MarketError, ResolutionError, Result};
pub use map::{Lookup, MarketMap, Sentinels};
pub use resolver::{MarketResolver, Resolution, ResolvedVia, resolve};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
