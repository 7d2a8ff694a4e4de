//! Rental lease contract definition

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::step_months;
use super::ContractError;

fn default_occupancy() -> f64 {
    100.0
}

fn default_label() -> String {
    "Loyer sans nom".to_string()
}

/// When within the year a new indexation cycle takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexationMode {
    /// New cycle applies from January of the qualifying year
    #[default]
    #[serde(rename = "january")]
    CalendarYear,
    /// New cycle applies from the contract's start-day anniversary
    #[serde(rename = "anniversary")]
    Anniversary,
}

/// A rental lease: periodic income subject to occupancy, indexation, and
/// rent-guarantee insurance (GLI) deduction.
///
/// Rates arrive as percentages on the wire (`3.0` = 3%); the accessor
/// methods convert to fractions. The custom indexation (frequency + rate)
/// and the reference index (IRL) are decoupled series with independent
/// timing modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseContract {
    #[serde(default = "default_label")]
    pub label: String,

    /// Base monthly rent before indexation and occupancy scaling
    #[serde(rename = "loyer_mensuel")]
    pub monthly_rent: f64,

    /// Monthly charges, never indexed
    #[serde(rename = "charges_mensuelles", default)]
    pub monthly_charges: f64,

    pub start_date: NaiveDate,

    /// Contract length in months; the derived end date is
    /// `start_date + duration_months`
    #[serde(rename = "duree_contrat_mois")]
    pub duration_months: u32,

    /// Occupancy rate in percent (100 = fully occupied)
    #[serde(rename = "taux_occupation", default = "default_occupancy")]
    pub occupancy_pct: f64,

    /// GLI insurance deduction in percent of gross rental income
    #[serde(rename = "tx_gli", default)]
    pub gli_pct: f64,

    /// Custom indexation frequency in years (0 = no indexation)
    #[serde(rename = "freq_idx", default)]
    pub index_frequency_years: u32,

    /// Custom indexation rate in percent per cycle
    #[serde(rename = "tx_idx", default)]
    pub index_rate_pct: f64,

    #[serde(rename = "date_idx_mode", default)]
    pub index_mode: IndexationMode,

    /// Reference index (IRL) annual rate in percent
    #[serde(rename = "tx_irl", default)]
    pub reference_rate_pct: f64,

    #[serde(rename = "date_irl_mode", default)]
    pub reference_mode: IndexationMode,
}

impl LeaseContract {
    /// Derived end date: start + contract length
    pub fn end_date(&self) -> NaiveDate {
        step_months(self.start_date, self.duration_months as i32)
    }

    /// Occupancy as a fraction in [0, 1]
    pub fn occupancy(&self) -> f64 {
        self.occupancy_pct / 100.0
    }

    /// GLI deduction as a fraction
    pub fn gli_rate(&self) -> f64 {
        self.gli_pct / 100.0
    }

    /// Custom indexation rate as a fraction per cycle
    pub fn index_rate(&self) -> f64 {
        self.index_rate_pct / 100.0
    }

    /// Reference index rate as a fraction per year
    pub fn reference_rate(&self) -> f64 {
        self.reference_rate_pct / 100.0
    }

    /// Boundary validation of structural fields
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.duration_months == 0 {
            return Err(ContractError::new(&self.label, "contract length must be at least 1 month"));
        }
        if self.monthly_rent < 0.0 {
            return Err(ContractError::new(&self.label, "monthly rent must not be negative"));
        }
        Ok(())
    }
}
