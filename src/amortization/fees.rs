//! Loan fee posting
//!
//! One-time fees (filing, brokerage, misc) and percentage-of-principal fees
//! (guarantee, mortgage collateral) post on the start date. The borrower
//! insurance recurs every December 31 within the loan term.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::step_months;
use crate::contracts::LoanContract;
use super::schedule::Deflator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeKind {
    #[serde(rename = "frais_dossier")]
    Filing,
    #[serde(rename = "frais_courtage")]
    Brokerage,
    #[serde(rename = "frais_divers")]
    Misc,
    #[serde(rename = "frais_caution")]
    Guarantee,
    #[serde(rename = "frais_garantie_hypothecaire")]
    Collateral,
    #[serde(rename = "frais_assurance")]
    Insurance,
}

/// A dated fee posting with its inflation-adjusted value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEvent {
    pub date: NaiveDate,
    pub kind: FeeKind,
    #[serde(rename = "montant")]
    pub amount: f64,
    #[serde(rename = "montant_reel")]
    pub real_amount: f64,
}

/// All fee postings for one loan, chronological.
///
/// Zero-amount fees are skipped. Percentage fees are computed once from the
/// principal. The insurance real line uses its own growth rate before
/// deflation; every other fee is deflated directly.
pub fn schedule_fees(loan: &LoanContract, deflator: &Deflator) -> Vec<FeeEvent> {
    let mut events = Vec::new();
    let start = loan.start_date;

    let one_time = [
        (FeeKind::Filing, loan.fees.filing),
        (FeeKind::Brokerage, loan.fees.brokerage),
        (FeeKind::Misc, loan.fees.misc),
        (FeeKind::Guarantee, loan.principal * loan.fees.guarantee_pct / 100.0),
        (FeeKind::Collateral, loan.principal * loan.fees.collateral_pct / 100.0),
    ];
    for (kind, amount) in one_time {
        if amount > 0.0 {
            events.push(FeeEvent {
                date: start,
                kind,
                amount,
                real_amount: deflator.real(amount, start),
            });
        }
    }

    if loan.fees.annual_insurance > 0.0 {
        let term_end = step_months(start, loan.term_months as i32);
        for year in start.year()..=term_end.year() {
            let posting = NaiveDate::from_ymd_opt(year, 12, 31).expect("Dec 31 always exists");
            if posting >= start && posting <= term_end {
                events.push(FeeEvent {
                    date: posting,
                    kind: FeeKind::Insurance,
                    amount: loan.fees.annual_insurance,
                    real_amount: deflator.real_insurance(loan.fees.annual_insurance, posting),
                });
            }
        }
    }

    events.sort_by_key(|e| e.date);
    events
}
