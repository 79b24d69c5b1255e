//! S-curve disbursement schedule.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::estimation::saturating_product;

/// Longest schedule produced, in months.
pub const MAX_SCHEDULE_MONTHS: u32 = 600;

/// Cumulative disbursement profile: month -> cumulative fraction of the total.
#[derive(Debug, Clone, PartialEq)]
pub struct SCurve {
    points: BTreeMap<u32, Decimal>,
}

impl SCurve {
    /// Build a curve from explicit points. Fractions are clamped to `[0, 1]`;
    /// month 0 is ignored since the curve is anchored at `(0, 0)`.
    pub fn new(points: BTreeMap<u32, Decimal>) -> Self {
        let points = points
            .into_iter()
            .filter_map(|(month, fraction)| {
                if month == 0 {
                    tracing::warn!("Ignoring S-curve point at month 0 = {}", fraction);
                    return None;
                }
                let clamped = fraction.clamp(Decimal::ZERO, Decimal::ONE);
                if clamped != fraction {
                    tracing::warn!("S-curve month {} = {} clamped to {}", month, fraction, clamped);
                }
                Some((month, clamped))
            })
            .collect();
        Self { points }
    }

    /// Build a curve from consecutive monthly fractions starting at month 1.
    pub fn from_fractions(fractions: &[Decimal]) -> Self {
        Self::new(
            fractions
                .iter()
                .enumerate()
                .map(|(i, f)| (i as u32 + 1, *f))
                .collect(),
        )
    }

    /// Last month with a defined value (0 for an empty curve).
    pub fn last_month(&self) -> u32 {
        self.points.keys().next_back().copied().unwrap_or(0)
    }

    /// Value at the last defined month (0 for an empty curve).
    pub fn last_value(&self) -> Decimal {
        self.points.values().next_back().copied().unwrap_or(Decimal::ZERO)
    }

    /// Cumulative fraction at time `t` (in months), for `0 <= t <= last_month`.
    ///
    /// Linear between defined points, anchored at `(0, 0)`.
    pub fn sample(&self, t: Decimal) -> Decimal {
        let mut prev_month = Decimal::ZERO;
        let mut prev_value = Decimal::ZERO;

        for (&month, &value) in &self.points {
            let month = Decimal::from(month);
            if t <= month {
                if month == prev_month {
                    return value;
                }
                return prev_value + (value - prev_value) * (t - prev_month) / (month - prev_month);
            }
            prev_month = month;
            prev_value = value;
        }

        prev_value
    }
}

/// Reference 12-month S-curve.
pub fn default_s_curve() -> SCurve {
    SCurve::from_fractions(&[
        dec!(0.02),
        dec!(0.06),
        dec!(0.12),
        dec!(0.20),
        dec!(0.30),
        dec!(0.42),
        dec!(0.55),
        dec!(0.67),
        dec!(0.78),
        dec!(0.87),
        dec!(0.94),
        dec!(1.00),
    ])
}

/// One month of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub cumulative_percent: Decimal,
    pub monthly_amount: Decimal,
    pub cumulative_amount: Decimal,
}

/// Monthly disbursement of `sell_price_total` over `duration_months`.
///
/// Months covered by the curve read it directly, also when the project ends
/// before the curve does. Months past the curve's last month interpolate
/// linearly from its last value up to 1.0 at the final month. Fractions are
/// clamped to `[0, 1]` and durations above [`MAX_SCHEDULE_MONTHS`] are capped.
///
/// Returns an empty schedule when the total or the duration is not positive.
pub fn disbursement_schedule(
    sell_price_total: Decimal,
    duration_months: u32,
    curve: &SCurve,
) -> Vec<ScheduleRow> {
    if sell_price_total <= Decimal::ZERO || duration_months == 0 {
        return Vec::new();
    }

    let duration_months = if duration_months > MAX_SCHEDULE_MONTHS {
        tracing::warn!(
            "Schedule of {} months capped at {}",
            duration_months,
            MAX_SCHEDULE_MONTHS
        );
        MAX_SCHEDULE_MONTHS
    } else {
        duration_months
    };

    let hundred = dec!(100);
    let last_month = curve.last_month();
    let mut previous_amount = Decimal::ZERO;
    let mut rows = Vec::new();

    for month in 1..=duration_months {
        let fraction = cumulative_fraction(curve, month, duration_months, last_month)
            .clamp(Decimal::ZERO, Decimal::ONE);
        let cumulative_amount = saturating_product(sell_price_total, fraction);

        rows.push(ScheduleRow {
            month,
            cumulative_percent: fraction * hundred,
            monthly_amount: cumulative_amount - previous_amount,
            cumulative_amount,
        });
        previous_amount = cumulative_amount;
    }

    rows
}

fn cumulative_fraction(curve: &SCurve, month: u32, duration: u32, last_month: u32) -> Decimal {
    if month <= last_month {
        return curve.sample(Decimal::from(month));
    }

    let last_value = curve.last_value();
    let remaining_months = Decimal::from(duration - last_month);
    let elapsed = Decimal::from(month - last_month);
    last_value + (Decimal::ONE - last_value) * elapsed / remaining_months
}
