//! Output structures for the rent projection

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::calendar::YearMonth;

/// One lease-month of rental cash flows.
///
/// `base`, `indexed`, and `reference_indexed` are independent parallel
/// series over the same grid: none is derived from another, so a "what if
/// no indexation" comparison is always available. The gross total uses the
/// indexed rent; charges are never indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub month: YearMonth,

    /// Rent without any indexation, occupancy-scaled
    pub base: f64,

    /// Rent with the custom indexation applied
    pub indexed: f64,

    /// Rent with the reference index (IRL) applied
    pub reference_indexed: f64,

    pub charges: f64,

    /// `indexed + charges`
    pub gross: f64,

    /// GLI deduction on the gross total
    pub insurance: f64,

    /// `gross - insurance`
    pub net: f64,

    pub occupancy_pct: f64,
    pub indexation_factor: f64,
    pub reference_factor: f64,
}

/// Summed rent columns for a month, a year, or a whole horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RentTotals {
    #[serde(rename = "loyer_base_total")]
    pub base: f64,
    #[serde(rename = "loyer_idx_total")]
    pub indexed: f64,
    #[serde(rename = "loyer_irl_total")]
    pub reference_indexed: f64,
    #[serde(rename = "charges_total")]
    pub charges: f64,
    #[serde(rename = "total_brut")]
    pub gross: f64,
    #[serde(rename = "total_net")]
    pub net: f64,
    #[serde(rename = "frais_gli_total")]
    pub insurance: f64,
}

impl RentTotals {
    pub fn add_record(&mut self, record: &PeriodRecord) {
        self.base += record.base;
        self.indexed += record.indexed;
        self.reference_indexed += record.reference_indexed;
        self.charges += record.charges;
        self.gross += record.gross;
        self.net += record.net;
        self.insurance += record.insurance;
    }
}

impl AddAssign for RentTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.base += rhs.base;
        self.indexed += rhs.indexed;
        self.reference_indexed += rhs.reference_indexed;
        self.charges += rhs.charges;
        self.gross += rhs.gross;
        self.net += rhs.net;
        self.insurance += rhs.insurance;
    }
}

/// Monthly averages of each rent series over a lease's month count
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MonthlyAverages {
    #[serde(rename = "loyer_base_mensuel_moyen")]
    pub base: f64,
    #[serde(rename = "loyer_idx_mensuel_moyen")]
    pub indexed: f64,
    #[serde(rename = "loyer_irl_mensuel_moyen")]
    pub reference_indexed: f64,
    #[serde(rename = "charges_mensuelles_moyennes")]
    pub charges: f64,
}

/// Full projection of a single lease
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseProjection {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// One record per calendar month, chronological
    pub records: Vec<PeriodRecord>,

    pub totals: RentTotals,
    pub annual: BTreeMap<i32, RentTotals>,

    #[serde(rename = "nb_mois")]
    pub month_count: u32,
    pub averages: MonthlyAverages,
}

/// Aggregated result of the rent engine across all leases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentResult {
    pub totals: RentTotals,

    #[serde(rename = "nb_baux")]
    pub lease_count: usize,

    /// Per-lease detail, input order preserved
    pub leases: Vec<LeaseProjection>,

    /// Calendar-aligned monthly sums across all leases; months inside the
    /// projection span with no active lease are present with zeros
    pub consolidated_monthly: BTreeMap<YearMonth, RentTotals>,

    /// Annual rollup of the consolidated monthly series
    pub annual: BTreeMap<i32, RentTotals>,
}
