//! ImmoSim - Cash-flow projection engine for real-estate investments
//!
//! This library provides:
//! - Rental lease projections with occupancy, indexation, and GLI insurance
//! - Loan amortization with fees, deferment, and early-repayment events
//! - Inflation-adjusted (real value) parallel series
//! - Calendar-aligned consolidation across contracts (daily, monthly, annual)
//! - A stage orchestrator producing one self-contained result bundle per run

pub mod amortization;
pub mod bundle;
pub mod calendar;
pub mod consolidate;
pub mod contracts;
pub mod engine;
pub mod indexation;
pub mod rent;
pub mod snapshot;

// Re-export commonly used types
pub use amortization::{LoanEngine, LoanProjection, LoanResult};
pub use bundle::ResultBundle;
pub use calendar::YearMonth;
pub use contracts::{LeaseContract, LoanContract};
pub use engine::{EngineStage, SimulationEngine};
pub use rent::{RentEngine, RentResult};
pub use snapshot::{GrowthAssumptions, InputSnapshot};
