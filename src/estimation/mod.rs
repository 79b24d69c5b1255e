//! Cost and markup estimation.
//!
//! Estimates are based on:
//! - Composition recipes (labor hours and bill of materials)
//! - Current material prices and labor rates
//! - The adopted BDI percentage

mod cost;
pub mod markup;

pub use cost::{
    AggregatedMaterial, aggregate_materials, composition_materials, grand_total, labor_total,
    line_total, material_total, recalculate_all, total_weight, unit_labor_cost,
    unit_material_cost,
};
pub(crate) use cost::{saturating_product, saturating_sum};
pub use markup::{
    BdiSimulation, BdiSimulationReport, ChannelReport, ChannelSplit, CostStructure,
    ProfitMargin, bdi_factor_or_fallback, channel_split, multi_factor_bdi_factor,
    profit_margin, simple_sell_price,
};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::CompositionCatalog;

/// Combined estimate for a budget.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetEstimate {
    /// Direct cost (labor + material) before markup.
    pub direct_cost: Decimal,
    pub labor_cost: Decimal,
    pub material_cost: Decimal,
    /// Adopted BDI percentage.
    pub bdi_percent: Decimal,
    /// Direct cost with BDI applied.
    pub sell_price: Decimal,
    /// Sell price per square meter of project area.
    pub cost_per_m2: Decimal,
    /// Breakdown by selected composition.
    pub items: Vec<ItemEstimate>,
}

/// Estimate for a single composition line.
#[derive(Debug, Clone, Serialize)]
pub struct ItemEstimate {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_total_cost: Decimal,
    pub line_total: Decimal,
}

/// Estimate a recalculated catalog under a flat BDI.
///
/// `area_m2` of zero yields a zero cost per m².
pub fn estimate(catalog: &CompositionCatalog, bdi_percent: Decimal, area_m2: u32) -> BudgetEstimate {
    let items: Vec<ItemEstimate> = catalog
        .selected()
        .map(|c| ItemEstimate {
            code: c.code().to_string(),
            description: c.description().to_string(),
            unit: c.unit().symbol().to_string(),
            quantity: c.quantity(),
            unit_total_cost: c.unit_total_cost(),
            line_total: line_total(c),
        })
        .collect();

    let labor_cost = labor_total(catalog);
    let material_cost = material_total(catalog);
    let direct_cost = labor_cost.saturating_add(material_cost);
    let sell_price = simple_sell_price(direct_cost, bdi_percent);
    let cost_per_m2 = if area_m2 == 0 {
        Decimal::ZERO
    } else {
        sell_price / Decimal::from(area_m2)
    };

    BudgetEstimate {
        direct_cost,
        labor_cost,
        material_cost,
        bdi_percent,
        sell_price,
        cost_per_m2,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MaterialCatalog;
    use crate::pricing::{LaborRates, MaterialPriceTable};
    use rust_decimal_macros::dec;

    #[test]
    fn test_estimate_matches_totals() {
        let materials = MaterialCatalog::seeded();
        let prices = MaterialPriceTable::from_catalog(&materials);
        let rates = LaborRates::new();
        let mut catalog = CompositionCatalog::seeded();
        catalog.set_quantity("ALV-001", dec!(100)).unwrap();
        catalog.set_quantity("PIN-001", dec!(200)).unwrap();
        recalculate_all(&mut catalog, &prices, &rates);

        let estimate = estimate(&catalog, dec!(25), 50);

        assert_eq!(estimate.items.len(), 2);
        assert_eq!(estimate.direct_cost, grand_total(&catalog));
        assert_eq!(estimate.sell_price, estimate.direct_cost * dec!(1.25));
        assert_eq!(estimate.cost_per_m2, estimate.sell_price / dec!(50));
        let items_sum: Decimal = estimate.items.iter().map(|i| i.line_total).sum();
        assert_eq!(items_sum, estimate.direct_cost);
    }

    #[test]
    fn test_estimate_zero_area() {
        let catalog = CompositionCatalog::seeded();
        let estimate = estimate(&catalog, dec!(25), 0);
        assert_eq!(estimate.cost_per_m2, Decimal::ZERO);
        assert!(estimate.items.is_empty());
    }
}
