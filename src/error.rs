//! Error types for the budget engine.

use rust_decimal::Decimal;

/// Errors raised by validated catalog and table setters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Material id not present in the material catalog.
    #[error("Unknown material: {id}")]
    UnknownMaterial { id: String },

    /// Worker role not in the recognized role set.
    #[error("Unknown labor role: {role}")]
    UnknownRole { role: String },

    /// Composition reference code not present in the composition catalog.
    #[error("Unknown composition: {code}")]
    UnknownComposition { code: String },
}

/// Errors raised by the markup (BDI) engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    /// Taxes and profit consume the whole revenue, so the BDI denominator is not positive.
    #[error("Invalid markup configuration: taxes ({taxes}) + profit ({profit}) must stay below 100% of revenue")]
    InvalidMarkupConfiguration { taxes: Decimal, profit: Decimal },
}

/// Errors raised while loading a persisted config or an exported budget.
///
/// Any of these rejects the whole load; nothing is applied partially.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Document is not valid JSON or does not match the expected shape.
    #[error("Malformed budget data: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A value is present but out of its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The document references ids the catalogs do not know.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the settings layer.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Setting path does not name a known setting.
    #[error("Unknown setting: {path}")]
    UnknownKey { path: String },

    /// Value could not be parsed or violates the setting's bounds.
    #[error("Invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    /// Settings file could not be parsed.
    #[error("Settings file is malformed: {0}")]
    Import(#[from] ImportError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while writing CSV exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for import operations.
pub type ImportResult<T> = std::result::Result<T, ImportError>;
