//! Budget-level configuration: adopted BDI, project area and BDI simulation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::estimation::BdiSimulation;
use crate::format::clamp_input;

/// Default adopted BDI percentage.
pub const DEFAULT_BDI_PERCENT: Decimal = dec!(25);

/// Default project area in square meters.
pub const DEFAULT_AREA_M2: u32 = 100;

/// Budget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetConfig {
    /// Final adopted BDI percentage (non-negative).
    pub bdi_final: Decimal,
    /// Project area in m² (at least 1).
    pub area_obra: u32,
    /// Two-channel BDI simulation, when the user has configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bdi_simulation: Option<BdiSimulation>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            bdi_final: DEFAULT_BDI_PERCENT,
            area_obra: DEFAULT_AREA_M2,
            bdi_simulation: None,
        }
    }
}

impl BudgetConfig {
    /// Set the adopted BDI. Negative values are clamped to zero.
    pub fn set_bdi_final(&mut self, bdi_percent: Decimal) {
        if bdi_percent.is_sign_negative() && !bdi_percent.is_zero() {
            tracing::warn!("Negative BDI {} clamped to zero", bdi_percent);
        }
        self.bdi_final = clamp_input(bdi_percent);
    }

    /// Set the project area. Zero is raised to 1 m².
    pub fn set_area(&mut self, area_m2: u32) {
        if area_m2 == 0 {
            tracing::warn!("Project area of zero raised to 1 m²");
        }
        self.area_obra = area_m2.max(1);
    }

    /// Simulation inputs in effect: the configured ones or the reference defaults.
    pub fn simulation_or_default(&self) -> BdiSimulation {
        self.bdi_simulation.unwrap_or_default()
    }

    /// Copy with every numeric field brought into range.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.set_bdi_final(self.bdi_final);
        config.set_area(self.area_obra);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp() {
        let mut config = BudgetConfig::default();
        config.set_bdi_final(dec!(-3));
        assert_eq!(config.bdi_final, Decimal::ZERO);
        config.set_area(0);
        assert_eq!(config.area_obra, 1);
        config.set_area(250);
        assert_eq!(config.area_obra, 250);
    }

    #[test]
    fn test_json_shape() {
        let config = BudgetConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["bdiFinal"], serde_json::json!(25));
        assert_eq!(value["areaObra"], serde_json::json!(100));
        assert!(value.get("bdiSimulation").is_none());

        let parsed: BudgetConfig =
            serde_json::from_str(r#"{"bdiFinal": 22.5, "areaObra": 80}"#).unwrap();
        assert_eq!(parsed.bdi_final, dec!(22.5));
        assert_eq!(parsed.bdi_simulation, None);
    }

    #[test]
    fn test_json_keeps_every_digit() {
        let mut config = BudgetConfig::default();
        config.set_bdi_final(dec!(22.123456789012345678));

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""bdiFinal":22.123456789012345678"#));

        let parsed: BudgetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.bdi_final, dec!(22.123456789012345678));
    }
}
