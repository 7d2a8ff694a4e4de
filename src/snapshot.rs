//! Input boundary: the snapshot of contracts and economic assumptions
//!
//! The orchestrator receives an [`InputSnapshot`] value and returns a result
//! bundle; there is no ambient shared store. Missing keys fall back to empty
//! contract lists and default growth rates, so the engine never fails on
//! absent optional input.

use serde::{Deserialize, Serialize};

use crate::contracts::{LeaseContract, LoanContract};

fn default_inflation_pct() -> f64 {
    2.0
}

fn default_insurance_growth_pct() -> f64 {
    2.5
}

/// Economic growth and inflation assumptions, percent per year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthAssumptions {
    #[serde(rename = "taux_inflation", default = "default_inflation_pct")]
    pub inflation_pct: f64,

    #[serde(
        rename = "taux_croissance_assurance_emprunteur",
        default = "default_insurance_growth_pct"
    )]
    pub insurance_growth_pct: f64,
}

impl Default for GrowthAssumptions {
    fn default() -> Self {
        Self {
            inflation_pct: default_inflation_pct(),
            insurance_growth_pct: default_insurance_growth_pct(),
        }
    }
}

impl GrowthAssumptions {
    /// Annual inflation as a fraction
    pub fn inflation(&self) -> f64 {
        self.inflation_pct / 100.0
    }

    /// Annual borrower-insurance growth as a fraction
    pub fn insurance_growth(&self) -> f64 {
        self.insurance_growth_pct / 100.0
    }

    /// Daily-compounded rate equivalent to the given annual rate
    pub fn daily_rate(annual: f64) -> f64 {
        (1.0 + annual).powf(1.0 / 365.25) - 1.0
    }
}

/// Full input to one projection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    #[serde(rename = "loyers", default)]
    pub leases: Vec<LeaseContract>,

    #[serde(rename = "prets", default)]
    pub loans: Vec<LoanContract>,

    #[serde(rename = "croissance", default)]
    pub growth: GrowthAssumptions,
}
