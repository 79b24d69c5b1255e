//! Direct cost breakdown by channel and by category.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::catalog::CompositionCatalog;
use crate::estimation::{saturating_product, saturating_sum};

/// Subtotal for one composition category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCost {
    pub category: String,
    pub labor: Decimal,
    pub material: Decimal,
    pub total: Decimal,
    pub share_percent: Decimal,
}

/// Direct cost split into labor and material, and into categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub labor_total: Decimal,
    pub material_total: Decimal,
    pub direct_total: Decimal,
    pub labor_share_percent: Decimal,
    pub material_share_percent: Decimal,
    /// Categories with a positive subtotal, in order of first appearance in the catalog.
    pub categories: Vec<CategoryCost>,
}

fn share(part: Decimal, total: Decimal) -> Decimal {
    part.checked_div(total)
        .map(|ratio| saturating_product(ratio, dec!(100)))
        .unwrap_or(Decimal::ZERO)
}

/// Break down the direct cost of a recalculated catalog.
pub fn cost_breakdown(catalog: &CompositionCatalog) -> CostBreakdown {
    let mut categories: Vec<CategoryCost> = Vec::new();

    for composition in catalog.selected() {
        let labor = saturating_product(composition.unit_labor_cost(), composition.quantity());
        let material = saturating_product(composition.unit_material_cost(), composition.quantity());

        let pos = match categories
            .iter()
            .position(|c| c.category == composition.category())
        {
            Some(pos) => pos,
            None => {
                categories.push(CategoryCost {
                    category: composition.category().to_string(),
                    labor: Decimal::ZERO,
                    material: Decimal::ZERO,
                    total: Decimal::ZERO,
                    share_percent: Decimal::ZERO,
                });
                categories.len() - 1
            }
        };
        let entry = &mut categories[pos];
        entry.labor = entry.labor.saturating_add(labor);
        entry.material = entry.material.saturating_add(material);
        entry.total = entry.total.saturating_add(labor.saturating_add(material));
    }

    let labor_total = saturating_sum(categories.iter().map(|c| c.labor));
    let material_total = saturating_sum(categories.iter().map(|c| c.material));
    let direct_total = labor_total.saturating_add(material_total);

    categories.retain(|c| c.total > Decimal::ZERO);
    for category in &mut categories {
        category.share_percent = share(category.total, direct_total);
    }

    CostBreakdown {
        labor_total,
        material_total,
        direct_total,
        labor_share_percent: share(labor_total, direct_total),
        material_share_percent: share(material_total, direct_total),
        categories,
    }
}
