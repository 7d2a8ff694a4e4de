//! Published result bundle
//!
//! The orchestrator returns one [`ResultBundle`] value per run: a flat
//! scalar summary under the published keys, the full per-family detail, and
//! the list of stage errors. Callers own the bundle; nothing is written to a
//! shared store.

use serde::{Deserialize, Serialize};

use crate::amortization::LoanResult;
use crate::consolidate::safe_ratio;
use crate::rent::RentResult;

/// Flat scalar summary of a projection run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_loyers_base: f64,
    pub total_loyers_idx: f64,
    pub total_loyers_irl: f64,
    pub total_charges: f64,
    pub total_brut: f64,
    pub total_net: f64,
    pub total_frais_gli: f64,
    pub nb_baux: usize,

    pub total_paiements: f64,
    pub total_principal: f64,
    pub total_interets: f64,
    pub total_frais: f64,
    pub cout_total_credit: f64,
    pub nb_prets: usize,
    pub paiement_mensuel_moyen: f64,

    /// Net rental income over gross rental income; zero when no rent
    pub rentabilite_nette: f64,
}

impl Summary {
    fn from_results(rent: &RentResult, loans: &LoanResult) -> Self {
        Self {
            total_loyers_base: rent.totals.base,
            total_loyers_idx: rent.totals.indexed,
            total_loyers_irl: rent.totals.reference_indexed,
            total_charges: rent.totals.charges,
            total_brut: rent.totals.gross,
            total_net: rent.totals.net,
            total_frais_gli: rent.totals.insurance,
            nb_baux: rent.lease_count,

            total_paiements: loans.totals.payments,
            total_principal: loans.totals.principal,
            total_interets: loans.totals.interest,
            total_frais: loans.totals.fees,
            cout_total_credit: loans.totals.cost,
            nb_prets: loans.loan_count,
            paiement_mensuel_moyen: loans.average_monthly_payment,

            rentabilite_nette: safe_ratio(rent.totals.net, rent.totals.gross),
        }
    }
}

/// Everything one projection run produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultBundle {
    #[serde(rename = "synthese")]
    pub summary: Summary,

    #[serde(rename = "loyers")]
    pub rent: RentResult,

    #[serde(rename = "prets")]
    pub loans: LoanResult,

    /// One entry per failed stage; an empty list means a clean run
    #[serde(rename = "erreurs")]
    pub errors: Vec<String>,
}

impl ResultBundle {
    /// Assemble a bundle, deriving the scalar summary from the family
    /// results. A family whose stage failed contributes zeros.
    pub fn from_parts(rent: RentResult, loans: LoanResult, errors: Vec<String>) -> Self {
        let summary = Summary::from_results(&rent, &loans);
        Self { summary, rent, loans, errors }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::LoanTotals;
    use crate::rent::RentTotals;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_mirrors_family_totals() {
        let rent = RentResult {
            totals: RentTotals {
                base: 12_000.0,
                indexed: 12_240.0,
                reference_indexed: 12_120.0,
                charges: 1200.0,
                gross: 13_440.0,
                net: 13_036.8,
                insurance: 403.2,
            },
            lease_count: 1,
            ..RentResult::default()
        };
        let loans = LoanResult {
            totals: LoanTotals {
                payments: 110_000.0,
                principal: 100_000.0,
                interest: 10_000.0,
                fees: 1500.0,
                cost: 111_500.0,
            },
            loan_count: 2,
            average_monthly_payment: 916.67,
            ..LoanResult::default()
        };

        let bundle = ResultBundle::from_parts(rent, loans, Vec::new());
        assert!(bundle.is_clean());
        assert_relative_eq!(bundle.summary.total_brut, 13_440.0);
        assert_relative_eq!(bundle.summary.cout_total_credit, 111_500.0);
        assert_eq!(bundle.summary.nb_prets, 2);
        assert_relative_eq!(bundle.summary.rentabilite_nette, 13_036.8 / 13_440.0);
    }

    #[test]
    fn test_empty_bundle_has_zero_ratio() {
        let bundle =
            ResultBundle::from_parts(RentResult::default(), LoanResult::default(), Vec::new());
        assert_relative_eq!(bundle.summary.rentabilite_nette, 0.0);
        assert_relative_eq!(bundle.summary.total_net, 0.0);
    }

    #[test]
    fn test_errors_mark_bundle_dirty() {
        let bundle = ResultBundle::from_parts(
            RentResult::default(),
            LoanResult::default(),
            vec!["contract `Pret 1`: principal must be positive".to_string()],
        );
        assert!(!bundle.is_clean());
    }

    #[test]
    fn test_published_keys_serialize() {
        let bundle =
            ResultBundle::from_parts(RentResult::default(), LoanResult::default(), Vec::new());
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["synthese"]["total_loyers_base"].is_number());
        assert!(json["synthese"]["paiement_mensuel_moyen"].is_number());
        assert!(json["loyers"]["nb_baux"].is_number());
        assert!(json["prets"]["nb_prets"].is_number());
        assert!(json["erreurs"].as_array().unwrap().is_empty());
    }
}
