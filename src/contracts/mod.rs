//! Contract data model: the immutable inputs to the projection engines
//!
//! Two contract families exist: rental leases (periodic income) and loans
//! (periodic debt service). Contracts are constructed from the input
//! snapshot, validated once at the boundary, and never mutated by the
//! engines.

mod lease;
mod loan;

pub use lease::{IndexationMode, LeaseContract};
pub use loan::{
    Deferment, DefermentKind, EarlyRepayment, EarlyRepaymentKind, FirstPaymentRule, LoanContract,
    LoanFees, Periodicity,
};

use thiserror::Error;

/// Structural problem with a contract, caught before any projection loop runs
#[derive(Debug, Clone, Error)]
#[error("contract `{label}`: {reason}")]
pub struct ContractError {
    pub label: String,
    pub reason: String,
}

impl ContractError {
    pub fn new(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { label: label.into(), reason: reason.into() }
    }
}
