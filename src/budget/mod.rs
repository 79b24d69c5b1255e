//! Budget context.
//!
//! A [`Budget`] owns everything a construction estimate depends on: the
//! material and composition catalogs, the editable price and rate tables and
//! the budget configuration. Every mutation recalculates the cached unit
//! costs, so readers always see consistent values.

mod config;
mod export;

pub use config::{BudgetConfig, DEFAULT_AREA_M2, DEFAULT_BDI_PERCENT};
pub use export::{BudgetExport, BudgetItem};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::catalog::{Composition, CompositionCatalog, MaterialCatalog, Role};
use crate::error::{CatalogError, ExportError, ImportError, ImportResult, MarkupError};
use crate::estimation::markup::simulate;
use crate::estimation::{
    AggregatedMaterial, BdiSimulation, BdiSimulationReport, BudgetEstimate, aggregate_materials,
    estimate, grand_total, recalculate_all, simple_sell_price,
};
use crate::format::parse_number;
use crate::pricing::{LaborRates, MaterialPriceTable};
use crate::reporting::{
    AbcRow, CostBreakdown, SCurve, ScheduleRow, classify_abc, cost_breakdown, csv,
    disbursement_schedule, items_from_catalog,
};
use crate::settings::Settings;

/// A construction budget and its inputs.
#[derive(Debug, Clone)]
pub struct Budget {
    materials: MaterialCatalog,
    compositions: CompositionCatalog,
    prices: MaterialPriceTable,
    rates: LaborRates,
    config: BudgetConfig,
}

impl Budget {
    /// Create a budget over the given catalogs with default prices, rates and config.
    pub fn new(materials: MaterialCatalog, compositions: CompositionCatalog) -> Self {
        let prices = MaterialPriceTable::from_catalog(&materials);
        let mut budget = Self {
            materials,
            compositions,
            prices,
            rates: LaborRates::new(),
            config: BudgetConfig::default(),
        };
        budget.recalculate();
        budget
    }

    /// Budget over the built-in catalogs.
    pub fn seeded() -> Self {
        Self::new(MaterialCatalog::seeded(), CompositionCatalog::seeded())
    }

    pub fn materials(&self) -> &MaterialCatalog {
        &self.materials
    }

    pub fn compositions(&self) -> &CompositionCatalog {
        &self.compositions
    }

    pub fn prices(&self) -> &MaterialPriceTable {
        &self.prices
    }

    pub fn rates(&self) -> &LaborRates {
        &self.rates
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Compositions with a positive quantity, in catalog order.
    pub fn selected_items(&self) -> impl Iterator<Item = &Composition> {
        self.compositions.selected()
    }

    fn recalculate(&mut self) {
        recalculate_all(&mut self.compositions, &self.prices, &self.rates);
    }

    /// Set the quantity of a composition. Negative values are clamped to zero.
    pub fn set_quantity(&mut self, code: &str, quantity: Decimal) -> Result<(), CatalogError> {
        self.compositions.set_quantity(code, quantity)?;
        self.recalculate();
        Ok(())
    }

    /// Set a quantity from user input. Non-numeric input counts as zero.
    pub fn set_quantity_str(&mut self, code: &str, input: &str) -> Result<(), CatalogError> {
        self.set_quantity(code, parse_number(input))
    }

    /// Set a material price. Returns the value actually stored.
    pub fn set_material_price(&mut self, id: &str, price: Decimal) -> Result<Decimal, CatalogError> {
        let stored = self.prices.set_price(&self.materials, id, price)?;
        self.recalculate();
        Ok(stored)
    }

    /// Set an hourly labor rate. Returns the value actually stored.
    pub fn set_labor_rate(&mut self, role: &str, rate: Decimal) -> Result<Decimal, CatalogError> {
        let stored = self.rates.set_rate(role, rate)?;
        self.recalculate();
        Ok(stored)
    }

    pub fn set_bdi_final(&mut self, bdi_percent: Decimal) {
        self.config.set_bdi_final(bdi_percent);
    }

    pub fn set_area(&mut self, area_m2: u32) {
        self.config.set_area(area_m2);
    }

    pub fn set_simulation(&mut self, simulation: Option<BdiSimulation>) {
        self.config.bdi_simulation = simulation;
    }

    /// Zero every quantity.
    pub fn clear_quantities(&mut self) {
        self.compositions.clear_quantities();
        self.recalculate();
    }

    /// Direct cost (labor + material) of every selected composition.
    pub fn direct_cost(&self) -> Decimal {
        grand_total(&self.compositions)
    }

    /// Direct cost with the adopted BDI applied.
    pub fn sell_price(&self) -> Decimal {
        simple_sell_price(self.direct_cost(), self.config.bdi_final)
    }

    /// Sell price per square meter of project area.
    pub fn cost_per_m2(&self) -> Decimal {
        self.estimate().cost_per_m2
    }

    pub fn estimate(&self) -> BudgetEstimate {
        estimate(&self.compositions, self.config.bdi_final, self.config.area_obra)
    }

    /// Consolidated material requirements keyed by material id.
    pub fn aggregate_materials(&self) -> BTreeMap<String, AggregatedMaterial> {
        aggregate_materials(&self.compositions, &self.materials, &self.prices)
    }

    /// ABC classification of the selected compositions by line total.
    pub fn abc(&self) -> Vec<AbcRow> {
        classify_abc(items_from_catalog(&self.compositions))
    }

    /// Monthly disbursement of the sell price.
    pub fn schedule(&self, duration_months: u32, curve: &SCurve) -> Vec<ScheduleRow> {
        disbursement_schedule(self.sell_price(), duration_months, curve)
    }

    pub fn breakdown(&self) -> CostBreakdown {
        cost_breakdown(&self.compositions)
    }

    /// Two-channel BDI simulation over the current labor and material totals.
    ///
    /// Uses the reference cost structures when none is configured.
    pub fn simulate_bdi(&self) -> Result<BdiSimulationReport, MarkupError> {
        let breakdown = self.breakdown();
        simulate(
            breakdown.labor_total,
            breakdown.material_total,
            &self.config.simulation_or_default(),
        )
    }

    /// Consolidated materials CSV.
    pub fn materials_csv(&self) -> Result<String, ExportError> {
        csv::materials_csv(&self.aggregate_materials())
    }

    /// Per-service materials CSV.
    pub fn detailed_csv(&self) -> Result<String, ExportError> {
        csv::detailed_csv(&self.compositions, &self.materials, &self.prices)
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        Settings::from_budget(self)
    }

    /// Export document with every positive quantity.
    pub fn export(&self, timestamp: DateTime<Utc>) -> BudgetExport {
        BudgetExport {
            config: self.settings(),
            items: self
                .selected_items()
                .map(|c| BudgetItem::new(c.code(), c.quantity()))
                .collect(),
            timestamp,
        }
    }

    /// Replace prices, rates and config with the given settings.
    ///
    /// Keys are validated before anything changes; on error the budget is
    /// left untouched. Entries absent from the settings fall back to defaults.
    pub fn apply_settings(&mut self, settings: &Settings) -> ImportResult<()> {
        let (prices, rates) = self.tables_from(settings)?;
        self.prices = prices;
        self.rates = rates;
        self.config = settings.budget_config().sanitized();
        self.recalculate();
        Ok(())
    }

    /// Load an export document, replacing settings and quantities.
    ///
    /// The whole document is validated first. Unknown roles, materials or
    /// compositions and negative quantities reject the import and leave the
    /// budget untouched.
    pub fn import(&mut self, export: &BudgetExport) -> ImportResult<()> {
        let (prices, rates) = self.tables_from(&export.config)?;

        for item in &export.items {
            if !self.compositions.contains(&item.composition_code) {
                return Err(CatalogError::UnknownComposition {
                    code: item.composition_code.clone(),
                }
                .into());
            }
            if item.quantity.is_sign_negative() && !item.quantity.is_zero() {
                return Err(ImportError::InvalidValue {
                    field: format!("quantidade ({})", item.composition_code),
                    reason: format!("negative quantity {}", item.quantity),
                });
            }
        }

        self.prices = prices;
        self.rates = rates;
        self.config = export.config.budget_config().sanitized();
        self.compositions.clear_quantities();
        for item in &export.items {
            self.compositions
                .set_quantity(&item.composition_code, item.quantity)?;
        }
        self.recalculate();

        tracing::info!(
            items = export.items.len(),
            exported_at = %export.timestamp,
            "Imported budget"
        );
        Ok(())
    }

    fn tables_from(&self, settings: &Settings) -> ImportResult<(MaterialPriceTable, LaborRates)> {
        let mut prices = MaterialPriceTable::from_catalog(&self.materials);
        for (id, price) in &settings.material_prices {
            prices.set_price(&self.materials, id, *price)?;
        }

        let mut rates = LaborRates::new();
        for (role, rate) in &settings.labor_costs {
            let role: Role = role
                .parse()
                .map_err(|_| CatalogError::UnknownRole { role: role.clone() })?;
            rates.set(role, *rate);
        }

        Ok((prices, rates))
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::CostStructure;
    use crate::format::MAX_INPUT_VALUE;
    use crate::reporting::default_s_curve;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_budget() -> Budget {
        let mut budget = Budget::seeded();
        budget.set_quantity("ALV-001", dec!(120)).unwrap();
        budget.set_quantity("REV-001", dec!(240)).unwrap();
        budget.set_quantity("PIN-001", dec!(300)).unwrap();
        budget.set_material_price("cimento", dec!(41.90)).unwrap();
        budget.set_labor_rate("pedreiro", dec!(32)).unwrap();
        budget.set_bdi_final(dec!(22.5));
        budget.set_area(85);
        budget
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_mutations_recalculate() {
        let mut budget = Budget::seeded();
        budget.set_quantity("ALV-001", dec!(10)).unwrap();
        let before = budget.direct_cost();
        assert!(before > Decimal::ZERO);

        budget.set_material_price("bloco_ceramico", dec!(5)).unwrap();
        assert_ne!(budget.direct_cost(), before);

        for c in budget.compositions().iter() {
            assert_eq!(c.unit_total_cost(), c.unit_material_cost() + c.unit_labor_cost());
        }
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut budget = Budget::seeded();
        assert_eq!(
            budget.set_quantity("XYZ-999", dec!(1)),
            Err(CatalogError::UnknownComposition {
                code: "XYZ-999".to_string()
            })
        );
        assert!(budget.set_material_price("ouro", dec!(1)).is_err());
        assert!(budget.set_labor_rate("astronauta", dec!(1)).is_err());
    }

    #[test]
    fn test_lenient_quantity_input() {
        let mut budget = Budget::seeded();
        budget.set_quantity_str("PIN-001", "1.250,5").unwrap();
        assert_eq!(budget.compositions().get("PIN-001").unwrap().quantity(), dec!(1250.5));

        budget.set_quantity_str("PIN-001", "abc").unwrap();
        assert_eq!(budget.compositions().get("PIN-001").unwrap().quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_sell_price_and_cost_per_m2() {
        let budget = sample_budget();
        let sell = budget.sell_price();
        assert_eq!(sell, budget.direct_cost() * dec!(1.225));
        assert_eq!(budget.cost_per_m2(), sell / dec!(85));
        assert_eq!(budget.estimate().sell_price, sell);
    }

    #[test]
    fn test_schedule_closes_at_sell_price() {
        let budget = sample_budget();
        let rows = budget.schedule(12, &default_s_curve());
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[11].cumulative_amount, budget.sell_price());
    }

    #[test]
    fn test_abc_covers_selected_items() {
        let budget = sample_budget();
        let rows = budget.abc();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.last().unwrap().cumulative_percent, dec!(100));
    }

    #[test]
    fn test_simulation_defaults_when_unconfigured() {
        let budget = sample_budget();
        let report = budget.simulate_bdi().unwrap();
        assert_eq!(report.direct_cost, budget.direct_cost());
        assert!(report.sell_price > report.direct_cost);
    }

    #[test]
    fn test_invalid_simulation_reported() {
        let mut budget = sample_budget();
        let mut simulation = BdiSimulation::default();
        simulation.material = CostStructure {
            taxes: dec!(60),
            profit: dec!(40),
            ..CostStructure::material_default()
        };
        budget.set_simulation(Some(simulation));
        assert!(matches!(
            budget.simulate_bdi(),
            Err(MarkupError::InvalidMarkupConfiguration { .. })
        ));
    }

    #[test]
    fn test_export_import_reproduces_costs() {
        let original = sample_budget();
        let json = original.export(timestamp()).to_json().unwrap();

        let mut restored = Budget::seeded();
        restored.import(&BudgetExport::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.direct_cost(), original.direct_cost());
        assert_eq!(restored.sell_price(), original.sell_price());
        assert_eq!(restored.config(), original.config());
        assert_eq!(restored.aggregate_materials(), original.aggregate_materials());
        for (a, b) in original.compositions().iter().zip(restored.compositions().iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_import_replaces_previous_quantities() {
        let mut budget = sample_budget();
        let export = BudgetExport {
            config: Settings::default(),
            items: vec![BudgetItem::new("HID-001", dec!(4))],
            timestamp: timestamp(),
        };
        budget.import(&export).unwrap();

        let selected: Vec<&str> = budget.selected_items().map(|c| c.code()).collect();
        assert_eq!(selected, vec!["HID-001"]);
        assert_eq!(budget.config().bdi_final, DEFAULT_BDI_PERCENT);
    }

    #[test]
    fn test_import_rejects_whole_document() {
        let mut budget = sample_budget();
        let before_cost = budget.direct_cost();
        let before_config = budget.config().clone();

        let mut export = budget.export(timestamp());
        export.config.bdi_final = dec!(40);
        export.items.push(BudgetItem::new("NOPE-1", dec!(1)));
        assert!(matches!(
            budget.import(&export),
            Err(ImportError::Catalog(CatalogError::UnknownComposition { .. }))
        ));

        let mut export = budget.export(timestamp());
        export.items[0].quantity = dec!(-5);
        assert!(matches!(budget.import(&export), Err(ImportError::InvalidValue { .. })));

        let mut export = budget.export(timestamp());
        export.config.labor_costs.insert("astronauta".to_string(), dec!(99));
        assert!(matches!(
            budget.import(&export),
            Err(ImportError::Catalog(CatalogError::UnknownRole { .. }))
        ));

        assert_eq!(budget.direct_cost(), before_cost);
        assert_eq!(budget.config(), &before_config);
    }

    #[test]
    fn test_out_of_range_quantity_saturates() {
        let mut budget = sample_budget();
        budget
            .set_quantity_str("ALV-001", "79228162514264337593543950335")
            .unwrap();
        assert_eq!(
            budget.compositions().get("ALV-001").unwrap().quantity(),
            MAX_INPUT_VALUE
        );
        budget.set_bdi_final(Decimal::MAX);
        assert_eq!(budget.config().bdi_final, MAX_INPUT_VALUE);

        assert!(budget.direct_cost() > Decimal::ZERO);
        assert!(budget.sell_price() >= budget.direct_cost());
        assert_eq!(budget.abc().last().unwrap().cumulative_percent, dec!(100));
        let rows = budget.schedule(12, &default_s_curve());
        assert_eq!(rows[11].cumulative_amount, budget.sell_price());
        assert!(budget.simulate_bdi().is_ok());
        assert!(budget.breakdown().direct_total > Decimal::ZERO);
        assert!(budget.materials_csv().is_ok());
    }

    #[test]
    fn test_export_keeps_full_precision() {
        let mut original = Budget::seeded();
        original
            .set_quantity("ALV-001", dec!(1.123456789012345678))
            .unwrap();
        original.set_material_price("cimento", dec!(41.987654321987654321)).unwrap();
        let json = original.export(timestamp()).to_json().unwrap();

        let mut restored = Budget::seeded();
        restored.import(&BudgetExport::from_json(&json).unwrap()).unwrap();

        assert_eq!(
            restored.compositions().get("ALV-001").unwrap().quantity(),
            dec!(1.123456789012345678)
        );
        assert_eq!(restored.prices(), original.prices());
        assert_eq!(restored.direct_cost(), original.direct_cost());
    }

    #[test]
    fn test_apply_settings_round_trip() {
        let original = sample_budget();
        let settings = original.settings();

        let mut other = Budget::seeded();
        other.apply_settings(&settings).unwrap();
        assert_eq!(other.prices(), original.prices());
        assert_eq!(other.rates(), original.rates());
        assert_eq!(other.config(), original.config());
    }
}
