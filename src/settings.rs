//! Persisted budget settings.
//!
//! The settings file holds the editable tables and budget configuration in
//! the JSON layout the calculator has always used:
//!
//! ```json
//! {
//!   "laborCosts": { "pedreiro": 28.5, "servente": 21 },
//!   "materialPrices": { "cimento": 38 },
//!   "bdiFinal": 25,
//!   "areaObra": 100,
//!   "bdiSimulation": { "labor": { ... }, "material": { ... }, "laborInvoicingPercent": 40 }
//! }
//! ```
//!
//! Individual values are addressed by dotted paths (`labor.pedreiro`,
//! `material.cimento`, `simulation.labor.taxes`) for the `config` commands.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::{Budget, BudgetConfig};
use crate::catalog::{MaterialCatalog, Role};
use crate::error::{ConfigError, ImportError, ImportResult};
use crate::estimation::{BdiSimulation, CostStructure};
use crate::format::parse_number_strict;
use crate::pricing::LaborRates;

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "ORCAMENTO_CONFIG";

const REQUIRED_FIELDS: [&str; 4] = ["laborCosts", "materialPrices", "bdiFinal", "areaObra"];

const FACTORS: [&str; 5] = ["administration", "risk", "financial_cost", "taxes", "profit"];

/// Editable tables plus budget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Hourly cost per role id.
    pub labor_costs: BTreeMap<String, Decimal>,
    /// Unit price per material id.
    pub material_prices: BTreeMap<String, Decimal>,
    pub bdi_final: Decimal,
    pub area_obra: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bdi_simulation: Option<BdiSimulation>,
}

impl Default for Settings {
    fn default() -> Self {
        let config = BudgetConfig::default();
        Self {
            labor_costs: LaborRates::new()
                .iter()
                .map(|(role, rate)| (role.id().to_string(), rate))
                .collect(),
            material_prices: MaterialCatalog::seeded()
                .iter()
                .map(|m| (m.id.clone(), m.default_price))
                .collect(),
            bdi_final: config.bdi_final,
            area_obra: config.area_obra,
            bdi_simulation: config.bdi_simulation,
        }
    }
}

impl Settings {
    /// Budget configuration part of the settings.
    pub fn budget_config(&self) -> BudgetConfig {
        BudgetConfig {
            bdi_final: self.bdi_final,
            area_obra: self.area_obra,
            bdi_simulation: self.bdi_simulation,
        }
    }

    /// Snapshot of a budget's tables and configuration.
    pub fn from_budget(budget: &Budget) -> Self {
        let config = budget.config();
        Self {
            labor_costs: budget
                .rates()
                .iter()
                .map(|(role, rate)| (role.id().to_string(), rate))
                .collect(),
            material_prices: budget
                .prices()
                .iter()
                .map(|(id, price)| (id.to_string(), price))
                .collect(),
            bdi_final: config.bdi_final,
            area_obra: config.area_obra,
            bdi_simulation: config.bdi_simulation,
        }
    }

    /// Apply these settings to a budget. See [`Budget::apply_settings`].
    pub fn apply_to(&self, budget: &mut Budget) -> ImportResult<()> {
        budget.apply_settings(self)
    }

    /// Parse settings JSON. Every required field must be present.
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse settings from an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> ImportResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(ImportError::InvalidValue {
                field: "config".to_string(),
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
        Ok(serde_json::from_value(value)?)
    }

    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orcamento")
            .join("config.json")
    }

    /// Load from the default path, using defaults when no file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(&Self::default_path())
    }

    /// Load from `path`, using defaults when no file exists there.
    ///
    /// A file that exists but cannot be read or parsed is an error, so callers
    /// never overwrite it with defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path())
    }

    /// Save to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Every setting as `(path, value)` pairs.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = vec![
            ("bdi_final".to_string(), self.bdi_final.to_string()),
            ("area_obra".to_string(), self.area_obra.to_string()),
        ];

        for (role, rate) in &self.labor_costs {
            out.push((format!("labor.{}", role), rate.to_string()));
        }
        for (id, price) in &self.material_prices {
            out.push((format!("material.{}", id), price.to_string()));
        }

        out.push((
            "simulation.enabled".to_string(),
            self.bdi_simulation.is_some().to_string(),
        ));
        if let Some(sim) = &self.bdi_simulation {
            out.push((
                "simulation.labor_invoicing_percent".to_string(),
                sim.labor_invoicing_percent.to_string(),
            ));
            for (channel, structure) in [("labor", &sim.labor), ("material", &sim.material)] {
                for factor in FACTORS {
                    if let Some(value) = factor_value(structure, factor) {
                        out.push((format!("simulation.{}.{}", channel, factor), value.to_string()));
                    }
                }
            }
        }

        out
    }

    /// Value of one setting.
    pub fn get(&self, path: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(key, _)| key == path)
            .map(|(_, value)| value)
    }

    /// Set one setting from its string form.
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), ConfigError> {
        if path == "simulation.enabled" {
            let enabled = parse_bool(path, value)?;
            self.bdi_simulation = match (enabled, self.bdi_simulation) {
                (true, Some(sim)) => Some(sim),
                (true, None) => Some(BdiSimulation::default()),
                (false, _) => None,
            };
            return Ok(());
        }

        if path == "area_obra" {
            let area: u32 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                path: path.to_string(),
                reason: format!("'{}' is not a whole number of square meters", value),
            })?;
            if area == 0 {
                return Err(ConfigError::InvalidValue {
                    path: path.to_string(),
                    reason: "area must be positive".to_string(),
                });
            }
            self.area_obra = area;
            return Ok(());
        }

        let number = parse_non_negative_setting(path, value)?;
        let slot = self.number_slot(path)?;
        *slot = number;
        Ok(())
    }

    /// Restore one setting to its default value.
    pub fn reset(&mut self, path: &str) -> Result<(), ConfigError> {
        let default = Settings::default();

        if path == "simulation.enabled" {
            self.bdi_simulation = default.bdi_simulation;
            return Ok(());
        }
        if path == "area_obra" {
            self.area_obra = default.area_obra;
            return Ok(());
        }

        let default_value = match path.strip_prefix("simulation.") {
            Some(_) => {
                let mut reference = default;
                reference.bdi_simulation = Some(BdiSimulation::default());
                *reference.number_slot(path)?
            }
            None => {
                let mut reference = default;
                *reference.number_slot(path)?
            }
        };
        *self.number_slot(path)? = default_value;
        Ok(())
    }

    fn number_slot(&mut self, path: &str) -> Result<&mut Decimal, ConfigError> {
        let unknown = || ConfigError::UnknownKey {
            path: path.to_string(),
        };

        if path == "bdi_final" {
            return Ok(&mut self.bdi_final);
        }
        if let Some(role) = path.strip_prefix("labor.") {
            if !self.labor_costs.contains_key(role) {
                let default = role
                    .parse::<Role>()
                    .ok()
                    .and_then(|role| LaborRates::new().get(role))
                    .ok_or_else(unknown)?;
                self.labor_costs.insert(role.to_string(), default);
            }
            return self.labor_costs.get_mut(role).ok_or_else(unknown);
        }
        if let Some(id) = path.strip_prefix("material.") {
            if !self.material_prices.contains_key(id) {
                let default = MaterialCatalog::seeded()
                    .get(id)
                    .map(|m| m.default_price)
                    .ok_or_else(unknown)?;
                self.material_prices.insert(id.to_string(), default);
            }
            return self.material_prices.get_mut(id).ok_or_else(unknown);
        }
        if let Some(rest) = path.strip_prefix("simulation.") {
            let Some(sim) = self.bdi_simulation.as_mut() else {
                return Err(ConfigError::InvalidValue {
                    path: path.to_string(),
                    reason: "enable the simulation first (simulation.enabled = true)".to_string(),
                });
            };
            if rest == "labor_invoicing_percent" {
                return Ok(&mut sim.labor_invoicing_percent);
            }
            let (channel, factor) = rest.split_once('.').ok_or_else(unknown)?;
            let structure = match channel {
                "labor" => &mut sim.labor,
                "material" => &mut sim.material,
                _ => return Err(unknown()),
            };
            return factor_slot(structure, factor).ok_or_else(unknown);
        }

        Err(unknown())
    }
}

fn factor_value(structure: &CostStructure, factor: &str) -> Option<Decimal> {
    let mut copy = *structure;
    factor_slot(&mut copy, factor).map(|v| *v)
}

fn factor_slot<'a>(structure: &'a mut CostStructure, factor: &str) -> Option<&'a mut Decimal> {
    match factor {
        "administration" => Some(&mut structure.administration),
        "risk" => Some(&mut structure.risk),
        "financial_cost" => Some(&mut structure.financial_cost),
        "taxes" => Some(&mut structure.taxes),
        "profit" => Some(&mut structure.profit),
        _ => None,
    }
}

fn parse_non_negative_setting(path: &str, value: &str) -> Result<Decimal, ConfigError> {
    let number = parse_number_strict(value).ok_or_else(|| ConfigError::InvalidValue {
        path: path.to_string(),
        reason: format!("'{}' is not a number", value),
    })?;
    if number.is_sign_negative() && !number.is_zero() {
        return Err(ConfigError::InvalidValue {
            path: path.to_string(),
            reason: "value must not be negative".to_string(),
        });
    }
    Ok(number)
}

fn parse_bool(path: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_list_settings() {
        let settings = Settings::default();
        let list = settings.list();
        assert!(!list.is_empty());
        assert!(list.iter().any(|(k, _)| k == "labor.pedreiro"));
        assert!(list.iter().any(|(k, _)| k == "material.cimento"));
        assert_eq!(settings.get("simulation.enabled").as_deref(), Some("false"));
    }

    #[test]
    fn test_get_set_reset() {
        let mut settings = Settings::default();

        settings.set("bdi_final", "27,5").unwrap();
        assert_eq!(settings.bdi_final, dec!(27.5));
        settings.set("material.cimento", "41.90").unwrap();
        assert_eq!(settings.material_prices["cimento"], dec!(41.90));
        settings.set("area_obra", "250").unwrap();
        assert_eq!(settings.area_obra, 250);

        settings.reset("bdi_final").unwrap();
        assert_eq!(settings.bdi_final, dec!(25));
        settings.reset("material.cimento").unwrap();
        assert_eq!(settings.material_prices["cimento"], dec!(38.00));
        settings.reset("area_obra").unwrap();
        assert_eq!(settings.area_obra, 100);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("material.ouro", "1"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(matches!(
            settings.set("labor.pedreiro", "abc"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set("bdi_final", "-1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set("area_obra", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set("simulation.labor.taxes", "5"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_simulation_paths() {
        let mut settings = Settings::default();
        settings.set("simulation.enabled", "true").unwrap();
        settings.set("simulation.labor.taxes", "9").unwrap();
        settings.set("simulation.labor_invoicing_percent", "55").unwrap();

        let sim = settings.bdi_simulation.unwrap();
        assert_eq!(sim.labor.taxes, dec!(9));
        assert_eq!(sim.labor_invoicing_percent, dec!(55));
        assert_eq!(settings.get("simulation.labor.taxes").as_deref(), Some("9"));

        settings.reset("simulation.labor.taxes").unwrap();
        assert_eq!(
            settings.bdi_simulation.unwrap().labor.taxes,
            CostStructure::labor_default().taxes
        );
        assert!(matches!(
            settings.set("simulation.labor.bribes", "1"),
            Err(ConfigError::UnknownKey { .. })
        ));

        settings.set("simulation.enabled", "off").unwrap();
        assert!(settings.bdi_simulation.is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut settings = Settings::default();
        settings.set("labor.servente", "22.75").unwrap();
        settings.set("simulation.enabled", "true").unwrap();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_set_restores_keys_missing_from_file() {
        let mut settings = Settings::default();
        settings.labor_costs.remove("pintor");
        settings.material_prices.remove("cimento");

        settings.set("labor.pintor", "30").unwrap();
        assert_eq!(settings.labor_costs["pintor"], dec!(30));
        settings.reset("material.cimento").unwrap();
        assert_eq!(settings.material_prices["cimento"], dec!(38));

        assert!(matches!(
            settings.set("labor.astronauta", "30"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(!settings.labor_costs.contains_key("astronauta"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"laborCosts": {"pedreiro": 99}, "materialPrices": {}, "bdiFinal": 31}"#,
        )
        .unwrap();

        assert!(matches!(
            Settings::load_or_default(&path),
            Err(ConfigError::Import(ImportError::MissingField { .. }))
        ));

        let missing = dir.path().join("absent.json");
        assert_eq!(Settings::load_or_default(&missing).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = Settings::from_json(r#"{"laborCosts": {}, "materialPrices": {}, "bdiFinal": 20}"#)
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingField { ref field } if field == "areaObra"));

        assert!(matches!(
            Settings::from_json("not json"),
            Err(ImportError::Json(_))
        ));
        assert!(matches!(
            Settings::from_json("[1, 2]"),
            Err(ImportError::InvalidValue { .. })
        ));
    }
}
