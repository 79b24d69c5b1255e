//! Markup (BDI) engine.
//!
//! BDI ("Benefícios e Despesas Indiretas") turns direct cost into sell price.
//! Two forms are supported: a flat percentage and the multi-factor formula
//! `(1 + AC + R + DF) / (1 - I - L)`, where the numerator carries
//! administration, risk and financial cost and the denominator removes the
//! share of revenue taken by taxes and profit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::cost::saturating_product;
use crate::error::MarkupError;
use crate::format::clamp_input;

/// Sell price for a direct cost under a flat BDI percentage.
pub fn simple_sell_price(direct_cost: Decimal, bdi_percent: Decimal) -> Decimal {
    saturating_product(direct_cost, Decimal::ONE + bdi_percent / dec!(100))
}

/// Multi-factor BDI multiplier. All inputs are fractions (0.05 = 5 %).
pub fn multi_factor_bdi_factor(
    administration: Decimal,
    risk: Decimal,
    financial_cost: Decimal,
    taxes: Decimal,
    profit: Decimal,
) -> Result<Decimal, MarkupError> {
    let denominator = Decimal::ONE - taxes - profit;
    if denominator <= Decimal::ZERO {
        return Err(MarkupError::InvalidMarkupConfiguration { taxes, profit });
    }
    let numerator = Decimal::ONE
        .saturating_add(administration)
        .saturating_add(risk)
        .saturating_add(financial_cost);
    numerator
        .checked_div(denominator)
        .ok_or(MarkupError::InvalidMarkupConfiguration { taxes, profit })
}

/// Factor for display: falls back to 1 (no markup) and flags the inputs as invalid.
pub fn bdi_factor_or_fallback(
    administration: Decimal,
    risk: Decimal,
    financial_cost: Decimal,
    taxes: Decimal,
    profit: Decimal,
) -> (Decimal, bool) {
    match multi_factor_bdi_factor(administration, risk, financial_cost, taxes, profit) {
        Ok(factor) => (factor, true),
        Err(e) => {
            tracing::warn!("{}", e);
            (Decimal::ONE, false)
        }
    }
}

/// Convert a multiplier into a BDI percentage (1.25 -> 25).
pub fn factor_to_percent(factor: Decimal) -> Decimal {
    saturating_product(factor - Decimal::ONE, dec!(100))
}

/// Revenue attributed to each invoicing channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSplit {
    pub labor_revenue: Decimal,
    pub material_revenue: Decimal,
}

/// Split a sell price between labor and material invoicing.
///
/// The labor percentage is clamped to `[0, 100]`; material takes the rest.
pub fn channel_split(sell_price_total: Decimal, labor_percent: Decimal) -> ChannelSplit {
    let labor_percent = labor_percent.clamp(Decimal::ZERO, dec!(100));
    let labor_revenue = sell_price_total * (labor_percent / dec!(100));
    ChannelSplit {
        labor_revenue,
        material_revenue: sell_price_total - labor_revenue,
    }
}

/// Profit left after taxes, absolute and relative to direct cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitMargin {
    pub amount: Decimal,
    /// Percent of direct cost; zero when direct cost is zero.
    pub percent: Decimal,
}

/// Profit margin of a revenue over its direct cost.
pub fn profit_margin(revenue_after_tax: Decimal, direct_cost: Decimal) -> ProfitMargin {
    let amount = revenue_after_tax.saturating_sub(direct_cost);
    let percent = if direct_cost.is_zero() {
        Decimal::ZERO
    } else {
        amount
            .checked_div(direct_cost)
            .map(|ratio| saturating_product(ratio, dec!(100)))
            .unwrap_or(Decimal::ZERO)
    };
    ProfitMargin { amount, percent }
}

/// Cost-structure percentages for one channel (25 = 25 %).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostStructure {
    pub administration: Decimal,
    pub risk: Decimal,
    pub financial_cost: Decimal,
    pub taxes: Decimal,
    pub profit: Decimal,
}

impl CostStructure {
    /// Reference structure for labor services.
    pub fn labor_default() -> Self {
        Self {
            administration: dec!(4.00),
            risk: dec!(1.27),
            financial_cost: dec!(1.23),
            taxes: dec!(8.65),
            profit: dec!(7.40),
        }
    }

    /// Reference structure for material supply.
    pub fn material_default() -> Self {
        Self {
            administration: dec!(3.00),
            risk: dec!(0.97),
            financial_cost: dec!(0.59),
            taxes: dec!(3.65),
            profit: dec!(6.16),
        }
    }

    /// Multi-factor BDI multiplier for this structure.
    pub fn factor(&self) -> Result<Decimal, MarkupError> {
        let hundred = dec!(100);
        multi_factor_bdi_factor(
            self.administration / hundred,
            self.risk / hundred,
            self.financial_cost / hundred,
            self.taxes / hundred,
            self.profit / hundred,
        )
    }

    /// Copy with every percentage clamped to be non-negative.
    pub fn sanitized(&self) -> Self {
        Self {
            administration: clamp_input(self.administration),
            risk: clamp_input(self.risk),
            financial_cost: clamp_input(self.financial_cost),
            taxes: clamp_input(self.taxes),
            profit: clamp_input(self.profit),
        }
    }
}

/// Two-channel BDI simulation inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdiSimulation {
    pub labor: CostStructure,
    pub material: CostStructure,
    /// Share of the sell price invoiced as labor services (percent).
    pub labor_invoicing_percent: Decimal,
}

impl Default for BdiSimulation {
    fn default() -> Self {
        Self {
            labor: CostStructure::labor_default(),
            material: CostStructure::material_default(),
            labor_invoicing_percent: dec!(40),
        }
    }
}

/// Simulation result for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelReport {
    pub direct_cost: Decimal,
    pub factor: Decimal,
    pub bdi_percent: Decimal,
    pub sell_price: Decimal,
    /// Revenue invoiced through this channel under the invoicing split.
    pub invoiced_revenue: Decimal,
    pub taxes: Decimal,
    pub profit: Decimal,
}

/// Full simulation result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BdiSimulationReport {
    pub labor: ChannelReport,
    pub material: ChannelReport,
    pub direct_cost: Decimal,
    pub sell_price: Decimal,
    /// Single BDI percentage equivalent to applying both channel factors.
    pub effective_bdi_percent: Decimal,
    pub revenue_after_tax: Decimal,
    pub margin: ProfitMargin,
}

/// Run the two-channel BDI simulation.
///
/// Each channel's direct cost is marked up by its own factor. Taxes and
/// profit are then computed on the revenue each channel actually invoices,
/// which follows `labor_invoicing_percent` rather than the cost proportions.
pub fn simulate(
    labor_direct: Decimal,
    material_direct: Decimal,
    simulation: &BdiSimulation,
) -> Result<BdiSimulationReport, MarkupError> {
    let hundred = dec!(100);
    let labor_structure = simulation.labor.sanitized();
    let material_structure = simulation.material.sanitized();

    let labor_factor = labor_structure.factor()?;
    let material_factor = material_structure.factor()?;

    let labor_sell = saturating_product(labor_direct, labor_factor);
    let material_sell = saturating_product(material_direct, material_factor);
    let sell_price = labor_sell.saturating_add(material_sell);
    let direct_cost = labor_direct.saturating_add(material_direct);

    let invoicing = channel_split(sell_price, simulation.labor_invoicing_percent);

    let labor = ChannelReport {
        direct_cost: labor_direct,
        factor: labor_factor,
        bdi_percent: factor_to_percent(labor_factor),
        sell_price: labor_sell,
        invoiced_revenue: invoicing.labor_revenue,
        taxes: invoicing.labor_revenue * (labor_structure.taxes / hundred),
        profit: invoicing.labor_revenue * (labor_structure.profit / hundred),
    };
    let material = ChannelReport {
        direct_cost: material_direct,
        factor: material_factor,
        bdi_percent: factor_to_percent(material_factor),
        sell_price: material_sell,
        invoiced_revenue: invoicing.material_revenue,
        taxes: invoicing.material_revenue * (material_structure.taxes / hundred),
        profit: invoicing.material_revenue * (material_structure.profit / hundred),
    };

    let effective_bdi_percent = if direct_cost.is_zero() {
        Decimal::ZERO
    } else {
        sell_price
            .checked_div(direct_cost)
            .map(factor_to_percent)
            .unwrap_or(Decimal::ZERO)
    };
    let revenue_after_tax = sell_price
        .saturating_sub(labor.taxes)
        .saturating_sub(material.taxes);

    Ok(BdiSimulationReport {
        labor,
        material,
        direct_cost,
        sell_price,
        effective_bdi_percent,
        revenue_after_tax,
        margin: profit_margin(revenue_after_tax, direct_cost),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sell_price() {
        assert_eq!(simple_sell_price(dec!(1000), dec!(25)), dec!(1250));
        assert_eq!(simple_sell_price(dec!(1000), Decimal::ZERO), dec!(1000));
    }

    #[test]
    fn test_multi_factor_neutral() {
        let zero = Decimal::ZERO;
        assert_eq!(
            multi_factor_bdi_factor(zero, zero, zero, zero, zero).unwrap(),
            Decimal::ONE
        );
    }

    #[test]
    fn test_multi_factor_formula() {
        // (1 + 0.04 + 0.01 + 0.01) / (1 - 0.1 - 0.1) = 1.06 / 0.8
        let factor =
            multi_factor_bdi_factor(dec!(0.04), dec!(0.01), dec!(0.01), dec!(0.1), dec!(0.1))
                .unwrap();
        assert_eq!(factor, dec!(1.325));
    }

    #[test]
    fn test_multi_factor_rejects_full_revenue_deductions() {
        let zero = Decimal::ZERO;
        let err = multi_factor_bdi_factor(zero, zero, zero, dec!(0.6), dec!(0.4)).unwrap_err();
        assert_eq!(
            err,
            MarkupError::InvalidMarkupConfiguration {
                taxes: dec!(0.6),
                profit: dec!(0.4)
            }
        );
        assert!(multi_factor_bdi_factor(zero, zero, zero, dec!(0.7), dec!(0.5)).is_err());
    }

    #[test]
    fn test_fallback_factor() {
        let zero = Decimal::ZERO;
        assert_eq!(
            bdi_factor_or_fallback(zero, zero, zero, dec!(1), zero),
            (Decimal::ONE, false)
        );
        assert_eq!(
            bdi_factor_or_fallback(dec!(0.25), zero, zero, zero, zero),
            (dec!(1.25), true)
        );
    }

    #[test]
    fn test_channel_split() {
        let split = channel_split(dec!(1000), dec!(40));
        assert_eq!(split.labor_revenue, dec!(400));
        assert_eq!(split.material_revenue, dec!(600));

        let clamped = channel_split(dec!(1000), dec!(150));
        assert_eq!(clamped.labor_revenue, dec!(1000));
        assert_eq!(clamped.material_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_profit_margin() {
        let margin = profit_margin(dec!(1100), dec!(1000));
        assert_eq!(margin.amount, dec!(100));
        assert_eq!(margin.percent, dec!(10));

        let zero_cost = profit_margin(dec!(50), Decimal::ZERO);
        assert_eq!(zero_cost.amount, dec!(50));
        assert_eq!(zero_cost.percent, Decimal::ZERO);
    }

    #[test]
    fn test_simulation_channels() {
        let simulation = BdiSimulation {
            labor: CostStructure {
                administration: dec!(10),
                risk: Decimal::ZERO,
                financial_cost: Decimal::ZERO,
                taxes: dec!(10),
                profit: dec!(10),
            },
            material: CostStructure {
                administration: Decimal::ZERO,
                risk: Decimal::ZERO,
                financial_cost: Decimal::ZERO,
                taxes: dec!(20),
                profit: Decimal::ZERO,
            },
            labor_invoicing_percent: dec!(50),
        };

        let report = simulate(dec!(800), dec!(400), &simulation).unwrap();

        // labor: 1.1 / 0.8 = 1.375 -> 1100; material: 1 / 0.8 = 1.25 -> 500
        assert_eq!(report.labor.sell_price, dec!(1100));
        assert_eq!(report.material.sell_price, dec!(500));
        assert_eq!(report.sell_price, dec!(1600));
        assert_eq!(report.direct_cost, dec!(1200));

        // invoiced 800 / 800; taxes 80 + 160
        assert_eq!(report.labor.invoiced_revenue, dec!(800));
        assert_eq!(report.labor.taxes, dec!(80));
        assert_eq!(report.labor.profit, dec!(80));
        assert_eq!(report.material.taxes, dec!(160));
        assert_eq!(report.revenue_after_tax, dec!(1360));
        assert_eq!(report.margin.amount, dec!(160));
    }

    #[test]
    fn test_simulation_propagates_invalid_channel() {
        let mut simulation = BdiSimulation::default();
        simulation.material.taxes = dec!(60);
        simulation.material.profit = dec!(40);
        assert!(simulate(dec!(100), dec!(100), &simulation).is_err());
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let simulation = BdiSimulation::default();
        let report = simulate(Decimal::MAX, Decimal::MAX, &simulation).unwrap();
        assert_eq!(report.sell_price, Decimal::MAX);
        assert_eq!(simple_sell_price(Decimal::MAX, dec!(25)), Decimal::MAX);

        let tiny = dec!(0.0000000000000000000000000001);
        let zero = Decimal::ZERO;
        assert!(
            multi_factor_bdi_factor(dec!(1000000), zero, zero, Decimal::ONE - tiny, zero).is_err()
        );
    }

    #[test]
    fn test_default_structures_are_valid() {
        let simulation = BdiSimulation::default();
        let labor = simulation.labor.factor().unwrap();
        let material = simulation.material.factor().unwrap();
        assert!(labor > Decimal::ONE);
        assert!(material > Decimal::ONE);
    }
}
