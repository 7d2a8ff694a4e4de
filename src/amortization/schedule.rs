//! Amortization schedule output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::calendar::YearMonth;
use crate::consolidate::CoherenceReport;
use crate::contracts::Periodicity;
use crate::snapshot::GrowthAssumptions;
use super::fees::FeeEvent;

/// One payment row of an amortization schedule.
///
/// The remaining balance is non-increasing outside a total-deferment phase
/// and reaches exactly zero on the last row; the schedule is truncated at
/// the first row where it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    #[serde(rename = "date_paiement")]
    pub date: NaiveDate,

    #[serde(rename = "paiement")]
    pub payment: f64,

    #[serde(rename = "interets")]
    pub interest: f64,

    /// Principal portion of the scheduled payment
    pub principal: f64,

    /// Remaining balance after this row
    #[serde(rename = "capital_restant")]
    pub balance: f64,

    /// Extra principal repaid by an early-repayment event at this date
    #[serde(rename = "remboursement_anticipe", default)]
    pub early_repayment: f64,

    /// Early-repayment penalty charged at this date
    #[serde(rename = "penalite", default)]
    pub penalty: f64,

    /// Interest folded into the balance during a total deferment
    #[serde(rename = "interets_capitalises", default)]
    pub capitalized_interest: f64,
}

/// Inflation-deflated counterpart of one schedule row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealValueRow {
    pub date: NaiveDate,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Summed loan columns over a horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanTotals {
    #[serde(rename = "total_paiements")]
    pub payments: f64,
    #[serde(rename = "total_principal")]
    pub principal: f64,
    #[serde(rename = "total_interets")]
    pub interest: f64,
    #[serde(rename = "total_frais")]
    pub fees: f64,
    /// `payments + fees`
    #[serde(rename = "cout_total_credit")]
    pub cost: f64,
}

impl AddAssign for LoanTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.payments += rhs.payments;
        self.principal += rhs.principal;
        self.interest += rhs.interest;
        self.fees += rhs.fees;
        self.cost += rhs.cost;
    }
}

/// Monthly (or annual) sums of the consolidated loan columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanPeriodTotals {
    #[serde(rename = "paiement_total")]
    pub payment: f64,
    #[serde(rename = "principal_total")]
    pub principal: f64,
    #[serde(rename = "interets_total")]
    pub interest: f64,
    #[serde(rename = "frais_total")]
    pub fees: f64,
}

impl AddAssign for LoanPeriodTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.payment += rhs.payment;
        self.principal += rhs.principal;
        self.interest += rhs.interest;
        self.fees += rhs.fees;
    }
}

/// Consolidated nominal and real columns for one calendar day
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoanDayTotals {
    #[serde(rename = "paiement_total")]
    pub payment: f64,
    #[serde(rename = "principal_total")]
    pub principal: f64,
    #[serde(rename = "interets_total")]
    pub interest: f64,
    #[serde(rename = "frais_total")]
    pub fees: f64,
    #[serde(rename = "capital_restant_total")]
    pub balance: f64,

    #[serde(rename = "paiement_reel_total")]
    pub real_payment: f64,
    #[serde(rename = "principal_reel_total")]
    pub real_principal: f64,
    #[serde(rename = "interets_reel_total")]
    pub real_interest: f64,
    #[serde(rename = "frais_reel_total")]
    pub real_fees: f64,
    #[serde(rename = "capital_restant_reel_total")]
    pub real_balance: f64,
}

/// Deflates nominal amounts into real (inflation-adjusted) value relative
/// to a loan's start date.
#[derive(Debug, Clone, Copy)]
pub struct Deflator {
    start: NaiveDate,
    daily_inflation: f64,
    daily_insurance_growth: f64,
}

impl Deflator {
    pub fn new(start: NaiveDate, growth: &GrowthAssumptions) -> Self {
        Self {
            start,
            daily_inflation: GrowthAssumptions::daily_rate(growth.inflation()),
            daily_insurance_growth: GrowthAssumptions::daily_rate(growth.insurance_growth()),
        }
    }

    fn days_since_start(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days().max(0) as f64
    }

    /// Compounding inflation factor at `date`
    pub fn inflation_factor(&self, date: NaiveDate) -> f64 {
        (1.0 + self.daily_inflation).powf(self.days_since_start(date))
    }

    /// Nominal amount expressed in start-date purchasing power
    pub fn real(&self, amount: f64, date: NaiveDate) -> f64 {
        amount / self.inflation_factor(date)
    }

    /// Borrower-insurance fee: grows at its own rate, then deflated, so the
    /// real line reflects net growth relative to general inflation.
    pub fn real_insurance(&self, amount: f64, date: NaiveDate) -> f64 {
        let growth = (1.0 + self.daily_insurance_growth).powf(self.days_since_start(date));
        amount * growth / self.inflation_factor(date)
    }
}

/// Full projection of a single loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProjection {
    pub label: String,

    #[serde(rename = "montant_initial")]
    pub principal: f64,
    #[serde(rename = "taux_interet")]
    pub annual_rate_pct: f64,
    #[serde(rename = "duree_mois")]
    pub term_months: u32,
    pub start_date: NaiveDate,
    #[serde(rename = "periodicite")]
    pub periodicity: Periodicity,

    /// Payment rows, chronological, truncated at payoff
    pub schedule: Vec<AmortizationRow>,

    /// Fee postings (one-time at start, recurring insurance)
    pub fees: Vec<FeeEvent>,

    /// Inflation-deflated counterpart of `schedule`
    pub real_schedule: Vec<RealValueRow>,

    pub totals: LoanTotals,
}

impl LoanProjection {
    /// Remaining balance as of an arbitrary date: the original principal
    /// before the first payment, the last known balance afterwards (zero
    /// after payoff).
    pub fn balance_as_of(&self, date: NaiveDate) -> f64 {
        let mut balance = self.principal;
        for row in &self.schedule {
            if row.date > date {
                break;
            }
            balance = row.balance;
        }
        balance
    }
}

/// Aggregated result of the loan engine across all loans
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanResult {
    pub totals: LoanTotals,

    #[serde(rename = "nb_prets")]
    pub loan_count: usize,

    /// Mean of the consolidated monthly payment totals, zero months included
    #[serde(rename = "paiement_mensuel_moyen")]
    pub average_monthly_payment: f64,

    /// Per-loan detail, input order preserved
    #[serde(rename = "stats_par_pret")]
    pub loans: Vec<LoanProjection>,

    /// Same-named columns summed across loans for each event day
    #[serde(rename = "serie_quotidienne")]
    pub consolidated_daily: BTreeMap<NaiveDate, LoanDayTotals>,

    /// Monthly sums over the full span, zero-filled
    #[serde(rename = "stats_mensuelles")]
    pub monthly: BTreeMap<YearMonth, LoanPeriodTotals>,

    #[serde(rename = "stats_annuelles")]
    pub annual: BTreeMap<i32, LoanPeriodTotals>,

    #[serde(rename = "rapport_coherence")]
    pub coherence: CoherenceReport,
}
