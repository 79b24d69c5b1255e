//! Construction budget engine.
//!
//! Prices service compositions from their labor hours and bills of materials,
//! applies BDI markup and derives the reports a budget needs: consolidated
//! material requirements, ABC curve, S-curve disbursement schedule and CSV
//! exports.

pub mod budget;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod estimation;
pub mod format;
pub mod pricing;
pub mod reporting;
pub mod settings;

pub use budget::{Budget, BudgetConfig, BudgetExport, BudgetItem};
pub use error::{CatalogError, ConfigError, ExportError, ImportError, MarkupError};
pub use settings::Settings;
