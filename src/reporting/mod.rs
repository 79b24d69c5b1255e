//! Derived views over an estimated budget: ABC curve, disbursement schedule,
//! cost breakdown and CSV exports.

mod abc;
mod breakdown;
pub mod csv;
mod schedule;

pub use abc::{AbcClass, AbcItem, AbcRow, CLASS_A_LIMIT, CLASS_B_LIMIT, classify_abc, items_from_catalog};
pub use breakdown::{CategoryCost, CostBreakdown, cost_breakdown};
pub use schedule::{MAX_SCHEDULE_MONTHS, SCurve, ScheduleRow, default_s_curve, disbursement_schedule};
