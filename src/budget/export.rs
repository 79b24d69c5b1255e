//! Budget export document.
//!
//! ```json
//! {
//!   "config": { "laborCosts": { ... }, "materialPrices": { ... }, "bdiFinal": 25, "areaObra": 100 },
//!   "itensCalculadora": [ { "refComposition": "ALV-001", "quantidade": 120 } ],
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};
use crate::settings::Settings;

const REQUIRED_FIELDS: [&str; 3] = ["config", "itensCalculadora", "timestamp"];
const REQUIRED_ITEM_FIELDS: [&str; 2] = ["refComposition", "quantidade"];

/// Quantity entered for one composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    #[serde(rename = "refComposition")]
    pub composition_code: String,
    #[serde(rename = "quantidade")]
    pub quantity: Decimal,
}

impl BudgetItem {
    pub fn new(composition_code: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            composition_code: composition_code.into(),
            quantity,
        }
    }
}

/// Snapshot of a budget: settings plus every entered quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetExport {
    pub config: Settings,
    #[serde(rename = "itensCalculadora")]
    pub items: Vec<BudgetItem>,
    pub timestamp: DateTime<Utc>,
}

impl BudgetExport {
    /// Parse an export document, rejecting it when any required field is absent.
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let Some(object) = value.as_object() else {
            return Err(ImportError::InvalidValue {
                field: "budget".to_string(),
                reason: "expected a JSON object".to_string(),
            });
        };

        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ImportError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        let Some(items) = object["itensCalculadora"].as_array() else {
            return Err(ImportError::InvalidValue {
                field: "itensCalculadora".to_string(),
                reason: "expected an array".to_string(),
            });
        };
        for (index, item) in items.iter().enumerate() {
            for field in REQUIRED_ITEM_FIELDS {
                if item.get(field).is_none() {
                    return Err(ImportError::MissingField {
                        field: format!("itensCalculadora[{}].{}", index, field),
                    });
                }
            }
        }

        let config = Settings::from_value(object["config"].clone())?;
        let items: Vec<BudgetItem> = serde_json::from_value(object["itensCalculadora"].clone())?;
        let timestamp: DateTime<Utc> = serde_json::from_value(object["timestamp"].clone())?;

        Ok(Self {
            config,
            items,
            timestamp,
        })
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> ImportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
