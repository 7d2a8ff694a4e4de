//! Loan amortization: schedules, fee postings, real-value series, and
//! cross-loan consolidation

pub mod engine;
pub mod fees;
pub mod schedule;

pub use engine::LoanEngine;
pub use fees::{FeeEvent, FeeKind};
pub use schedule::{
    AmortizationRow, Deflator, LoanDayTotals, LoanPeriodTotals, LoanProjection, LoanResult,
    LoanTotals, RealValueRow,
};
