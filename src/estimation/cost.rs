//! Cost engine: unit costs, totals and material aggregation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::{Composition, CompositionCatalog, MaterialCatalog, UnitKind};
use crate::pricing::{LaborRates, MaterialPriceTable};

/// Material cost of one unit of a composition.
///
/// Sum of `consumption × price × (1 + loss/100)` over the bill of materials.
/// Materials missing from the price table contribute zero.
pub fn unit_material_cost(composition: &Composition, prices: &MaterialPriceTable) -> Decimal {
    let costs = composition
        .materials()
        .iter()
        .map(|line| match prices.get(&line.material_id) {
            Some(price) => saturating_product(line.gross_consumption(), price),
            None => {
                tracing::warn!(
                    composition = composition.code(),
                    material = %line.material_id,
                    "Material has no price, contributing zero cost"
                );
                Decimal::ZERO
            }
        });
    saturating_sum(costs)
}

/// Labor cost of one unit of a composition.
///
/// Sum of `hours × rate` over professionals and helpers. Unknown roles contribute zero.
pub fn unit_labor_cost(composition: &Composition, rates: &LaborRates) -> Decimal {
    let costs = composition.labor().map(|labor| match rates.rate(&labor.role) {
        Some(rate) => saturating_product(labor.hours, rate),
        None => {
            tracing::warn!(
                composition = composition.code(),
                role = %labor.role,
                "Unknown labor role, contributing zero cost"
            );
            Decimal::ZERO
        }
    });
    saturating_sum(costs)
}

/// Recompute the cached unit costs of every composition.
///
/// Full scan; calling it twice with unchanged inputs yields identical values.
pub fn recalculate_all(
    catalog: &mut CompositionCatalog,
    prices: &MaterialPriceTable,
    rates: &LaborRates,
) {
    for composition in catalog.iter_mut() {
        let material = unit_material_cost(composition, prices);
        let labor = unit_labor_cost(composition, rates);
        composition.set_unit_costs(material, labor);
    }
    tracing::debug!("Recalculated unit costs for {} compositions", catalog.len());
}

/// Total for one composition line.
pub fn line_total(composition: &Composition) -> Decimal {
    saturating_product(composition.unit_total_cost(), composition.quantity())
}

/// Sum of every line total.
pub fn grand_total(catalog: &CompositionCatalog) -> Decimal {
    saturating_sum(catalog.iter().map(line_total))
}

/// Labor share of the grand total.
pub fn labor_total(catalog: &CompositionCatalog) -> Decimal {
    saturating_sum(
        catalog
            .iter()
            .map(|c| saturating_product(c.unit_labor_cost(), c.quantity())),
    )
}

/// Material share of the grand total.
pub fn material_total(catalog: &CompositionCatalog) -> Decimal {
    saturating_sum(
        catalog
            .iter()
            .map(|c| saturating_product(c.unit_material_cost(), c.quantity())),
    )
}

/// Product that saturates at the `Decimal` bounds instead of overflowing.
pub(crate) fn saturating_product(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        tracing::warn!("Amount {} x {} out of range, saturating", a, b);
        a.saturating_mul(b)
    })
}

/// Sum that saturates at the `Decimal` bounds instead of overflowing.
pub(crate) fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Consolidated requirement for one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMaterial {
    pub material_id: String,
    pub name: String,
    pub unit: UnitKind,
    pub unit_label: String,
    /// Amount including losses; whole units for discrete kinds.
    pub amount: Decimal,
    /// Only present when the material has a positive unit weight.
    pub weight_kg: Option<Decimal>,
    pub unit_price: Decimal,
}

impl AggregatedMaterial {
    /// Purchase cost of the aggregated amount.
    pub fn total_cost(&self) -> Decimal {
        saturating_product(self.amount, self.unit_price)
    }
}

/// Material requirements of a single composition at its current quantity.
///
/// Entries follow the bill-of-materials order; rounding is applied per line.
pub fn composition_materials(
    composition: &Composition,
    materials: &MaterialCatalog,
    prices: &MaterialPriceTable,
) -> Vec<AggregatedMaterial> {
    let mut raw: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::new();

    for line in composition.materials() {
        let amount = saturating_product(line.gross_consumption(), composition.quantity());
        let entry = raw.entry(line.material_id.as_str()).or_insert_with(|| {
            order.push(line.material_id.as_str());
            Decimal::ZERO
        });
        *entry = entry.saturating_add(amount);
    }

    order
        .into_iter()
        .filter_map(|id| build_entry(id, raw[id], materials, prices))
        .collect()
}

/// Consolidate materials across every composition with a positive quantity.
///
/// Amounts are summed before rounding, so discrete units are rounded once per
/// material. Returns an empty map when nothing has been selected.
pub fn aggregate_materials(
    catalog: &CompositionCatalog,
    materials: &MaterialCatalog,
    prices: &MaterialPriceTable,
) -> BTreeMap<String, AggregatedMaterial> {
    let mut raw: BTreeMap<&str, Decimal> = BTreeMap::new();

    for composition in catalog.selected() {
        for line in composition.materials() {
            let entry = raw.entry(line.material_id.as_str()).or_default();
            *entry = entry.saturating_add(saturating_product(
                line.gross_consumption(),
                composition.quantity(),
            ));
        }
    }

    raw.into_iter()
        .filter_map(|(id, amount)| {
            build_entry(id, amount, materials, prices).map(|entry| (id.to_string(), entry))
        })
        .collect()
}

fn build_entry(
    id: &str,
    raw_amount: Decimal,
    materials: &MaterialCatalog,
    prices: &MaterialPriceTable,
) -> Option<AggregatedMaterial> {
    let Some(material) = materials.get(id) else {
        tracing::warn!(material = id, "Skipping unknown material during aggregation");
        return None;
    };

    let amount = material.unit.round_amount(raw_amount);
    Some(AggregatedMaterial {
        material_id: material.id.clone(),
        name: material.name.clone(),
        unit: material.unit,
        unit_label: material.unit_label.clone(),
        amount,
        weight_kg: material.positive_weight().map(|w| saturating_product(amount, w)),
        unit_price: prices.get(id).unwrap_or(Decimal::ZERO),
    })
}

/// Total weight of an aggregation, in kilograms.
pub fn total_weight(entries: &BTreeMap<String, AggregatedMaterial>) -> Decimal {
    saturating_sum(entries.values().filter_map(|e| e.weight_kg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Material, Role};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn fixture() -> (MaterialCatalog, CompositionCatalog, MaterialPriceTable, LaborRates) {
        let materials = MaterialCatalog::new(vec![
            Material::new("tinta", "Tinta", UnitKind::Container, dec!(10)).with_weight(dec!(18)),
            Material::new("areia", "Areia", UnitKind::Volume, dec!(100)),
        ]);
        let compositions = CompositionCatalog::new(vec![
            Composition::new("A", "Pintura", "Pintura", UnitKind::Area)
                .with_professional(Role::Painter.id(), dec!(0.5))
                .with_helper(Role::Helper.id(), dec!(0.25))
                .with_material("tinta", dec!(2), dec!(5)),
            Composition::new("B", "Pisos", "Contrapiso", UnitKind::Area)
                .with_professional(Role::Mason.id(), dec!(1))
                .with_material("areia", dec!(0.05), dec!(10))
                .with_material("tinta", dec!(0.1), dec!(0)),
        ]);
        let prices = MaterialPriceTable::from_catalog(&materials);
        let mut rates = LaborRates::new();
        rates.set(Role::Painter, dec!(20));
        rates.set(Role::Helper, dec!(10));
        rates.set(Role::Mason, dec!(30));
        (materials, compositions, prices, rates)
    }

    #[test]
    fn test_unit_material_cost_scenario() {
        let (_, mut catalog, prices, rates) = fixture();
        catalog.set_quantity("A", dec!(3)).unwrap();
        recalculate_all(&mut catalog, &prices, &rates);

        let a = catalog.get("A").unwrap();
        assert_eq!(a.unit_material_cost(), dec!(21));
        assert_eq!(a.unit_labor_cost(), dec!(12.5));
        assert_eq!(a.unit_total_cost(), dec!(33.5));
        assert_eq!(unit_material_cost(a, &prices) * a.quantity(), dec!(63));
        assert_eq!(line_total(a), dec!(100.5));
    }

    #[test]
    fn test_total_is_material_plus_labor_for_all() {
        let (_, mut catalog, prices, rates) = fixture();
        recalculate_all(&mut catalog, &prices, &rates);
        for c in CompositionCatalog::seeded().iter().chain(catalog.iter()) {
            assert_eq!(c.unit_total_cost(), c.unit_material_cost() + c.unit_labor_cost());
        }
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let materials = MaterialCatalog::seeded();
        let prices = MaterialPriceTable::from_catalog(&materials);
        let rates = LaborRates::new();
        let mut catalog = CompositionCatalog::seeded();

        recalculate_all(&mut catalog, &prices, &rates);
        let first: Vec<Composition> = catalog.iter().cloned().collect();
        recalculate_all(&mut catalog, &prices, &rates);
        let second: Vec<Composition> = catalog.iter().cloned().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_material_and_role_contribute_zero() {
        let materials = MaterialCatalog::new(vec![]);
        let prices = MaterialPriceTable::from_catalog(&materials);
        let rates = LaborRates::new();
        let composition = Composition::new("X", "Cat", "Desc", UnitKind::Area)
            .with_professional("astronauta", dec!(3))
            .with_material("ouro", dec!(1), dec!(0));

        assert_eq!(unit_material_cost(&composition, &prices), Decimal::ZERO);
        assert_eq!(unit_labor_cost(&composition, &rates), Decimal::ZERO);
    }

    #[test]
    fn test_price_change_is_reflected_after_recalculate() {
        let (materials, mut catalog, mut prices, rates) = fixture();
        recalculate_all(&mut catalog, &prices, &rates);
        prices.set_price(&materials, "tinta", dec!(20)).unwrap();
        recalculate_all(&mut catalog, &prices, &rates);
        assert_eq!(catalog.get("A").unwrap().unit_material_cost(), dec!(42));
    }

    #[test]
    fn test_grand_total_and_channel_totals() {
        let (_, mut catalog, prices, rates) = fixture();
        catalog.set_quantity("A", dec!(2)).unwrap();
        catalog.set_quantity("B", dec!(10)).unwrap();
        recalculate_all(&mut catalog, &prices, &rates);

        // A: material 21, labor 12.5; B: material 5.5 + 1 = 6.5, labor 30
        assert_eq!(material_total(&catalog), dec!(42) + dec!(65));
        assert_eq!(labor_total(&catalog), dec!(25) + dec!(300));
        assert_eq!(
            grand_total(&catalog),
            material_total(&catalog) + labor_total(&catalog)
        );
    }

    #[test]
    fn test_aggregate_empty_without_quantities() {
        let (materials, catalog, prices, _) = fixture();
        assert!(aggregate_materials(&catalog, &materials, &prices).is_empty());
    }

    #[test]
    fn test_aggregate_rounds_discrete_units_once() {
        let (materials, mut catalog, prices, _) = fixture();
        catalog.set_quantity("A", dec!(1)).unwrap();
        catalog.set_quantity("B", dec!(3)).unwrap();

        let agg = aggregate_materials(&catalog, &materials, &prices);
        assert_eq!(agg.len(), 2);

        // tinta: 2.1 + 0.3 = 2.4 -> 3 cans
        let tinta = &agg["tinta"];
        assert_eq!(tinta.amount, dec!(3));
        assert_eq!(tinta.weight_kg, Some(dec!(54)));
        assert_eq!(tinta.total_cost(), dec!(30));

        // areia: 0.05 * 1.1 * 3 = 0.165, continuous, no weight
        let areia = &agg["areia"];
        assert_eq!(areia.amount, dec!(0.165));
        assert_eq!(areia.weight_kg, None);

        assert_eq!(total_weight(&agg), dec!(54));
    }

    #[test]
    fn test_aggregate_only_references_selected_compositions() {
        let (materials, mut catalog, prices, _) = fixture();
        catalog.set_quantity("A", dec!(1)).unwrap();
        let agg = aggregate_materials(&catalog, &materials, &prices);
        assert_eq!(agg.keys().collect::<Vec<_>>(), vec!["tinta"]);
    }

    #[test]
    fn test_composition_materials_per_service() {
        let (materials, mut catalog, prices, _) = fixture();
        catalog.set_quantity("B", dec!(10)).unwrap();
        let lines = composition_materials(catalog.get("B").unwrap(), &materials, &prices);
        let ids: Vec<&str> = lines.iter().map(|l| l.material_id.as_str()).collect();
        assert_eq!(ids, vec!["areia", "tinta"]);
        assert_eq!(lines[1].amount, dec!(1));
    }
}
