//! Loan contract definition: amortization parameters, fees, deferment,
//! and early-repayment events

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ContractError;

fn default_label() -> String {
    "Pret sans nom".to_string()
}

fn default_true() -> bool {
    true
}

/// Payment periodicity of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Periodicity {
    #[default]
    #[serde(rename = "Mensuelle")]
    Monthly,
    #[serde(rename = "Trimestrielle")]
    Quarterly,
    #[serde(rename = "Semestrielle")]
    SemiAnnual,
    #[serde(rename = "Annuelle")]
    Annual,
}

impl Periodicity {
    /// Number of payment periods per year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Periodicity::Monthly => 12,
            Periodicity::Quarterly => 4,
            Periodicity::SemiAnnual => 2,
            Periodicity::Annual => 1,
        }
    }

    /// Calendar months spanned by one period
    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }
}

/// When the first payment falls relative to the loan start date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirstPaymentRule {
    #[default]
    #[serde(rename = "À la date de début du prêt")]
    AtStart,
    #[serde(rename = "Au début de la période suivante")]
    NextPeriodStart,
    #[serde(rename = "À la fin de la première période")]
    EndOfFirstPeriod,
}

/// Kind of payment relief during a deferment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefermentKind {
    /// Interest-only payments; principal untouched
    #[serde(rename = "Partiel (Intérêts)")]
    Partial,
    /// No payment at all; interest capitalized onto the balance
    #[serde(rename = "Total (Pas de paiement)")]
    Total,
}

/// Deferred-repayment setup phase at the start of the loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deferment {
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(rename = "duree", default)]
    pub duration_months: u32,

    #[serde(rename = "type")]
    pub kind: DefermentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarlyRepaymentKind {
    #[serde(rename = "Partiel")]
    Partial,
    #[serde(rename = "Total")]
    Total,
}

/// A dated early-repayment event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyRepayment {
    #[serde(rename = "montant")]
    pub amount: f64,

    pub date: NaiveDate,

    /// Penalty in percent of the repaid amount
    #[serde(rename = "penalite", default)]
    pub penalty_pct: f64,

    #[serde(rename = "type")]
    pub kind: EarlyRepaymentKind,
}

impl EarlyRepayment {
    pub fn penalty_rate(&self) -> f64 {
        self.penalty_pct / 100.0
    }
}

/// Fee set attached to a loan.
///
/// Fixed fees post once on the start date; `guarantee_pct` and
/// `collateral_pct` are percentages of the principal, also posted at start;
/// `annual_insurance` recurs every December 31 within the loan term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanFees {
    #[serde(rename = "frais_dossier", default)]
    pub filing: f64,

    #[serde(rename = "frais_courtage", default)]
    pub brokerage: f64,

    #[serde(rename = "frais_divers", default)]
    pub misc: f64,

    /// Guarantee deposit, percent of principal
    #[serde(rename = "frais_caution", default)]
    pub guarantee_pct: f64,

    /// Mortgage collateral fee, percent of principal
    #[serde(rename = "frais_garantie_hypothecaire", default)]
    pub collateral_pct: f64,

    /// Borrower insurance, posted once per year
    #[serde(rename = "frais_assurance", default)]
    pub annual_insurance: f64,
}

/// An amortizing loan contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanContract {
    #[serde(default = "default_label")]
    pub label: String,

    #[serde(rename = "montant")]
    pub principal: f64,

    /// Annual interest rate in percent
    #[serde(rename = "taux_interet")]
    pub annual_rate_pct: f64,

    #[serde(rename = "duree_mois")]
    pub term_months: u32,

    pub start_date: NaiveDate,

    #[serde(rename = "periodicite", default)]
    pub periodicity: Periodicity,

    #[serde(rename = "remboursement_option", default)]
    pub first_payment: FirstPaymentRule,

    #[serde(flatten)]
    pub fees: LoanFees,

    #[serde(rename = "differe", default)]
    pub deferment: Option<Deferment>,

    #[serde(rename = "remboursements_anticipes", default)]
    pub early_repayments: Vec<EarlyRepayment>,
}

impl LoanContract {
    /// Annual rate as a fraction
    pub fn annual_rate(&self) -> f64 {
        self.annual_rate_pct / 100.0
    }

    /// Interest rate per payment period
    pub fn period_rate(&self) -> f64 {
        self.annual_rate() / self.periodicity.periods_per_year() as f64
    }

    /// Nominal number of payment periods over the term
    pub fn period_count(&self) -> u32 {
        self.term_months / self.periodicity.months_per_period()
    }

    /// Deferment phase, if one is active
    pub fn active_deferment(&self) -> Option<&Deferment> {
        self.deferment.as_ref().filter(|d| d.active && d.duration_months > 0)
    }

    /// Boundary validation of structural fields
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.principal <= 0.0 {
            return Err(ContractError::new(&self.label, "principal must be positive"));
        }
        if self.period_count() == 0 {
            return Err(ContractError::new(
                &self.label,
                "term must cover at least one payment period",
            ));
        }
        Ok(())
    }
}
