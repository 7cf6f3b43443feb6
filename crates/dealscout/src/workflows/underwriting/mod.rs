//! Pure underwriting calculator: property financial inputs plus an assumption
//! snapshot in, standardized investment metrics out. No I/O lives here; the
//! matching service persists results and attaches timestamps.

mod calculator;
pub mod domain;

pub use calculator::{calculate, UnderwritingError};
pub use domain::{
    Assumptions, AssumptionOverrides, DealInputs, DealMetrics, ExpenseBreakdown, MetricRating,
    MetricRatings,
};
