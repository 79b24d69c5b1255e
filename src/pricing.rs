//! Mutable price and rate tables.
//!
//! Both tables validate keys against the recognized set and clamp negative
//! values to zero instead of failing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::catalog::{MaterialCatalog, Role};
use crate::error::CatalogError;
use crate::format::clamp_input;

/// Current unit price per material id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPriceTable {
    prices: BTreeMap<String, Decimal>,
}

impl MaterialPriceTable {
    /// Table holding every catalog material at its default price.
    pub fn from_catalog(catalog: &MaterialCatalog) -> Self {
        Self {
            prices: catalog
                .iter()
                .map(|m| (m.id.clone(), m.default_price))
                .collect(),
        }
    }

    /// Current price for a material.
    pub fn get(&self, material_id: &str) -> Option<Decimal> {
        self.prices.get(material_id).copied()
    }

    /// Set a material price. Returns the value actually stored.
    pub fn set_price(
        &mut self,
        catalog: &MaterialCatalog,
        material_id: &str,
        price: Decimal,
    ) -> Result<Decimal, CatalogError> {
        if !catalog.contains(material_id) {
            return Err(CatalogError::UnknownMaterial {
                id: material_id.to_string(),
            });
        }
        if price.is_sign_negative() && !price.is_zero() {
            tracing::warn!("Negative price {} for {} clamped to zero", price, material_id);
        }
        let price = clamp_input(price);
        self.prices.insert(material_id.to_string(), price);
        Ok(price)
    }

    /// Restore every price to the catalog default.
    pub fn reset_to_defaults(&mut self, catalog: &MaterialCatalog) {
        *self = Self::from_catalog(catalog);
    }

    /// Prices ordered by material id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Hourly cost per worker role.
#[derive(Debug, Clone, PartialEq)]
pub struct LaborRates {
    rates: BTreeMap<Role, Decimal>,
}

impl LaborRates {
    /// Reference hourly costs (BRL, with social charges).
    pub fn new() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(Role::Mason, dec!(28.50));
        rates.insert(Role::Helper, dec!(21.00));
        rates.insert(Role::Carpenter, dec!(28.50));
        rates.insert(Role::RebarWorker, dec!(28.50));
        rates.insert(Role::Electrician, dec!(31.00));
        rates.insert(Role::Plumber, dec!(30.00));
        rates.insert(Role::Painter, dec!(27.50));
        rates.insert(Role::Tiler, dec!(29.00));
        Self { rates }
    }

    /// Rate for a role id, if the role is recognized.
    pub fn rate(&self, role_id: &str) -> Option<Decimal> {
        let role = role_id.parse::<Role>().ok()?;
        self.get(role)
    }

    pub fn get(&self, role: Role) -> Option<Decimal> {
        self.rates.get(&role).copied()
    }

    /// Set the rate for a role id. Returns the value actually stored.
    pub fn set_rate(&mut self, role_id: &str, rate: Decimal) -> Result<Decimal, CatalogError> {
        let role = role_id
            .parse::<Role>()
            .map_err(|_| CatalogError::UnknownRole {
                role: role_id.to_string(),
            })?;
        Ok(self.set(role, rate))
    }

    /// Set the rate for a recognized role. Returns the value actually stored.
    pub fn set(&mut self, role: Role, rate: Decimal) -> Decimal {
        if rate.is_sign_negative() && !rate.is_zero() {
            tracing::warn!("Negative rate {} for {} clamped to zero", rate, role);
        }
        let rate = clamp_input(rate);
        self.rates.insert(role, rate);
        rate
    }

    /// Rates in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, Decimal)> {
        self.rates.iter().map(|(k, v)| (*k, *v))
    }
}

impl Default for LaborRates {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table_seeded_from_defaults() {
        let catalog = MaterialCatalog::seeded();
        let prices = MaterialPriceTable::from_catalog(&catalog);
        assert_eq!(prices.len(), catalog.len());
        assert_eq!(prices.get("cimento"), Some(dec!(38.00)));
    }

    #[test]
    fn test_set_price_rejects_unknown_material() {
        let catalog = MaterialCatalog::seeded();
        let mut prices = MaterialPriceTable::from_catalog(&catalog);

        let err = prices.set_price(&catalog, "ouro", dec!(1)).unwrap_err();
        assert_eq!(err, CatalogError::UnknownMaterial { id: "ouro".to_string() });
        assert!(prices.get("ouro").is_none());
    }

    #[test]
    fn test_set_price_clamps_negative() {
        let catalog = MaterialCatalog::seeded();
        let mut prices = MaterialPriceTable::from_catalog(&catalog);

        assert_eq!(prices.set_price(&catalog, "cimento", dec!(-5)).unwrap(), Decimal::ZERO);
        assert_eq!(prices.get("cimento"), Some(Decimal::ZERO));

        prices.reset_to_defaults(&catalog);
        assert_eq!(prices.get("cimento"), Some(dec!(38.00)));
    }

    #[test]
    fn test_labor_rates() {
        let mut rates = LaborRates::new();
        assert_eq!(rates.rate("pedreiro"), Some(dec!(28.50)));
        assert_eq!(rates.rate("astronauta"), None);

        rates.set_rate("servente", dec!(23)).unwrap();
        assert_eq!(rates.get(Role::Helper), Some(dec!(23)));

        assert_eq!(
            rates.set_rate("astronauta", dec!(1)).unwrap_err(),
            CatalogError::UnknownRole { role: "astronauta".to_string() }
        );
        assert_eq!(rates.set(Role::Painter, dec!(-1)), Decimal::ZERO);
    }
}
