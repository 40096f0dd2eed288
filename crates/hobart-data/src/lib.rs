#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod characteristics;
pub mod error;
pub mod panel;
pub mod transform;
pub mod wide;

pub use align::align_panel;
pub use characteristics::{Characteristics, CharacteristicsConfig, EntityCharacteristics};
pub use error::{DataError, Result};
pub use panel::{IndexReturnRecord, ReturnKind, ReturnPanel, ReturnRecord, ReturnSeries};
pub use transform::{TransformConfig, compute_returns, pivot_variables, to_long, transform};
pub use wide::{WideRow, WideTable, WideTableConfig};

/// Column holding the bare entity or index name.
pub const NAME_COL: &str = "name";
/// Column holding an entity's first-appearance position in its input table.
pub const ENTITY_ORDER_COL: &str = "entity_order";
/// Column holding the observation date.
pub const DATE_COL: &str = "date";
/// Column holding the variable label in long form.
pub const VARIABLE_COL: &str = "variable";
/// Column holding the observed level in long form.
pub const VALUE_COL: &str = "value";
/// Period-over-period simple return column.
pub const SIMPLE_RETURN_COL: &str = "simple_return";
/// `ln(1 + value)` column.
pub const LOG_VALUE_COL: &str = "log_value";
/// First difference of [`LOG_VALUE_COL`].
pub const LOG_RETURN_COL: &str = "log_return";

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
