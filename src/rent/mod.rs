//! Rent projection: per-lease monthly cash flows and consolidated series

mod engine;
mod series;

pub use engine::RentEngine;
pub use series::{LeaseProjection, MonthlyAverages, PeriodRecord, RentResult, RentTotals};
