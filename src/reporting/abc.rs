//! ABC cost curve.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::catalog::CompositionCatalog;
use crate::estimation::{line_total, saturating_product, saturating_sum};

/// Cumulative share up to which items are class A.
pub const CLASS_A_LIMIT: Decimal = dec!(70);
/// Cumulative share up to which items are class B.
pub const CLASS_B_LIMIT: Decimal = dec!(90);

/// ABC class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    /// Class for a cumulative percentage.
    pub fn for_cumulative(cumulative_percent: Decimal) -> Self {
        if cumulative_percent <= CLASS_A_LIMIT {
            AbcClass::A
        } else if cumulative_percent <= CLASS_B_LIMIT {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }
}

impl std::fmt::Display for AbcClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        };
        f.pad(s)
    }
}

/// Input item.
#[derive(Debug, Clone, PartialEq)]
pub struct AbcItem {
    pub name: String,
    pub cost: Decimal,
}

impl AbcItem {
    pub fn new(name: impl Into<String>, cost: Decimal) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

/// Classified row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbcRow {
    pub name: String,
    pub cost: Decimal,
    pub percent_of_total: Decimal,
    pub cumulative_percent: Decimal,
    pub class: AbcClass,
}

/// Sort items by descending cost and classify them by cumulative share.
///
/// Ties keep their input order. When the total is zero every row reports 0 %
/// and falls in class C.
pub fn classify_abc(items: Vec<AbcItem>) -> Vec<AbcRow> {
    let mut items = items;
    items.sort_by(|a, b| b.cost.cmp(&a.cost));

    let total = saturating_sum(items.iter().map(|i| i.cost));
    let hundred = dec!(100);
    let mut running = Decimal::ZERO;

    items
        .into_iter()
        .map(|item| {
            running = running.saturating_add(item.cost);
            let (percent_of_total, cumulative_percent, class) = if total.is_zero() {
                (Decimal::ZERO, Decimal::ZERO, AbcClass::C)
            } else {
                let cumulative = share(running, total, hundred);
                (
                    share(item.cost, total, hundred),
                    cumulative,
                    AbcClass::for_cumulative(cumulative),
                )
            };
            AbcRow {
                name: item.name,
                cost: item.cost,
                percent_of_total,
                cumulative_percent,
                class,
            }
        })
        .collect()
}

fn share(part: Decimal, total: Decimal, hundred: Decimal) -> Decimal {
    part.checked_div(total)
        .map(|ratio| saturating_product(ratio, hundred))
        .unwrap_or(Decimal::ZERO)
}

/// ABC input from the selected compositions, in catalog order.
pub fn items_from_catalog(catalog: &CompositionCatalog) -> Vec<AbcItem> {
    catalog
        .selected()
        .map(|c| AbcItem::new(format!("{} - {}", c.code(), c.description()), line_total(c)))
        .collect()
}
