//! Projection orchestrator
//!
//! Runs the contract-family stages in a fixed order (loans, then rent) over
//! one input snapshot and assembles the result bundle. A stage failure is
//! isolated: the failed family contributes zeros and one error entry, and
//! the other stage still runs. Running the same snapshot twice yields
//! identical bundles.

use log::{info, warn};
use thiserror::Error;

use crate::amortization::{LoanEngine, LoanResult};
use crate::bundle::ResultBundle;
use crate::contracts::ContractError;
use crate::rent::{RentEngine, RentResult};
use crate::snapshot::InputSnapshot;

/// The closed set of projection stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStage {
    Loans,
    Rent,
}

impl EngineStage {
    pub const ALL: [EngineStage; 2] = [EngineStage::Loans, EngineStage::Rent];

    pub fn name(self) -> &'static str {
        match self {
            EngineStage::Loans => "prets",
            EngineStage::Rent => "loyers",
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("loan stage: {0}")]
    Loans(#[source] ContractError),

    #[error("rent stage: {0}")]
    Rent(#[source] ContractError),
}

/// Runs all projection stages over one input snapshot
#[derive(Debug, Default)]
pub struct SimulationEngine {
    rent: RentEngine,
}

impl SimulationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project the whole snapshot.
    ///
    /// Never fails as a whole: each stage error is recorded in the bundle
    /// and the corresponding family result stays at its zero default.
    pub fn run(&self, snapshot: &InputSnapshot) -> ResultBundle {
        let mut errors = Vec::new();

        let loans = LoanEngine::new(snapshot.growth.clone())
            .project(&snapshot.loans)
            .unwrap_or_else(|e| {
                let error = EngineError::Loans(e);
                warn!("{error}");
                errors.push(error.to_string());
                LoanResult::default()
            });

        let rent = self.rent.project(&snapshot.leases).unwrap_or_else(|e| {
            let error = EngineError::Rent(e);
            warn!("{error}");
            errors.push(error.to_string());
            RentResult::default()
        });

        info!(
            "projection run: {} leases, {} loans, {} stage errors",
            rent.lease_count,
            loans.loan_count,
            errors.len()
        );

        ResultBundle::from_parts(rent, loans, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(json: &str) -> InputSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_snapshot_yields_zero_bundle() {
        let bundle = SimulationEngine::new().run(&InputSnapshot::default());
        assert!(bundle.is_clean());
        assert_eq!(bundle.summary.nb_baux, 0);
        assert_eq!(bundle.summary.nb_prets, 0);
        assert_relative_eq!(bundle.summary.total_net, 0.0);
        assert_relative_eq!(bundle.summary.cout_total_credit, 0.0);
    }

    #[test]
    fn test_full_snapshot_end_to_end() {
        let input = snapshot(
            r#"{
                "loyers": [{
                    "label": "T2 centre",
                    "loyer_mensuel": 1000.0,
                    "charges_mensuelles": 100.0,
                    "start_date": "2025-08-02",
                    "duree_contrat_mois": 12,
                    "tx_gli": 3.0
                }],
                "prets": [{
                    "label": "Pret principal",
                    "montant": 120000.0,
                    "taux_interet": 0.0,
                    "duree_mois": 120,
                    "start_date": "2025-08-02"
                }]
            }"#,
        );
        let bundle = SimulationEngine::new().run(&input);

        assert!(bundle.is_clean());
        assert_eq!(bundle.summary.nb_baux, 1);
        assert_eq!(bundle.summary.nb_prets, 1);
        // 13 inclusive months of 1100 gross
        assert_relative_eq!(bundle.summary.total_brut, 13.0 * 1100.0);
        // Zero-rate loan repays exactly its principal
        assert_relative_eq!(bundle.summary.total_paiements, 120_000.0, max_relative = 1e-9);
        assert_relative_eq!(bundle.summary.total_interets, 0.0);
        assert_relative_eq!(bundle.summary.rentabilite_nette, 0.97);
    }

    #[test]
    fn test_same_snapshot_twice_gives_identical_bundles() {
        let input = snapshot(
            r#"{
                "loyers": [{
                    "label": "T2",
                    "loyer_mensuel": 850.0,
                    "start_date": "2025-01-15",
                    "duree_contrat_mois": 36,
                    "freq_idx": 1,
                    "tx_idx": 2.0
                }],
                "prets": [{
                    "label": "Pret",
                    "montant": 80000.0,
                    "taux_interet": 3.5,
                    "duree_mois": 180,
                    "start_date": "2025-01-15",
                    "frais_dossier": 500.0
                }]
            }"#,
        );
        let engine = SimulationEngine::new();
        let first = serde_json::to_value(engine.run(&input)).unwrap();
        let second = serde_json::to_value(engine.run(&input)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_loan_stage_failure_does_not_block_rent() {
        let input = snapshot(
            r#"{
                "loyers": [{
                    "label": "T2",
                    "loyer_mensuel": 1000.0,
                    "start_date": "2025-01-01",
                    "duree_contrat_mois": 12
                }],
                "prets": [{
                    "label": "Pret casse",
                    "montant": 0.0,
                    "taux_interet": 3.5,
                    "duree_mois": 120,
                    "start_date": "2025-01-01"
                }]
            }"#,
        );
        let bundle = SimulationEngine::new().run(&input);

        assert_eq!(bundle.errors.len(), 1);
        assert!(bundle.errors[0].contains("loan stage"));
        assert!(bundle.errors[0].contains("Pret casse"));
        // Loan family zeroed, rent family intact
        assert_relative_eq!(bundle.summary.total_paiements, 0.0);
        assert_eq!(bundle.summary.nb_prets, 0);
        assert_eq!(bundle.summary.nb_baux, 1);
        assert!(bundle.summary.total_brut > 0.0);
    }

    #[test]
    fn test_stage_order_is_fixed() {
        assert_eq!(EngineStage::ALL, [EngineStage::Loans, EngineStage::Rent]);
        assert_eq!(EngineStage::Loans.name(), "prets");
        assert_eq!(EngineStage::Rent.name(), "loyers");
    }
}
