//! Consolidation helpers shared by the rent and loan engines
//!
//! Annual rollups of monthly maps, guarded ratios, and the coherence report
//! over consolidated monthly loan payments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Group a monthly map by calendar year, summing the values.
pub fn annual_rollup<K, T, F>(monthly: &BTreeMap<K, T>, year_of: F) -> BTreeMap<i32, T>
where
    K: Ord + Copy,
    T: Copy + Default + AddAssign,
    F: Fn(K) -> i32,
{
    let mut annual: BTreeMap<i32, T> = BTreeMap::new();
    for (key, value) in monthly {
        *annual.entry(year_of(*key)).or_default() += *value;
    }
    annual
}

/// Ratio guarded against a zero or negative denominator.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Diagnostic over the consolidated monthly loan payments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoherenceReport {
    #[serde(rename = "total_mois")]
    pub month_count: usize,

    /// Months with a zero payment total
    #[serde(rename = "mois_zero")]
    pub zero_months: usize,

    #[serde(rename = "montant_min")]
    pub min: f64,
    #[serde(rename = "montant_max")]
    pub max: f64,
    #[serde(rename = "montant_moyen")]
    pub mean: f64,

    /// Coefficient of variation in percent (std / mean)
    #[serde(rename = "variation_pct")]
    pub variation_pct: f64,
}

impl CoherenceReport {
    /// Build the report from the chronological monthly payment totals.
    pub fn from_monthly_payments(payments: &[f64]) -> Self {
        if payments.is_empty() {
            return Self::default();
        }

        let month_count = payments.len();
        let zero_months = payments.iter().filter(|&&p| p == 0.0).count();
        let min = payments.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = payments.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = payments.iter().sum::<f64>() / month_count as f64;

        let variation_pct = if mean > 0.0 {
            let variance =
                payments.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / month_count as f64;
            variance.sqrt() / mean * 100.0
        } else {
            0.0
        };

        Self { month_count, zero_months, min, max, mean, variation_pct }
    }

    /// Months where nothing was paid although the horizon expected payments
    pub fn has_zero_month_gap(&self) -> bool {
        self.zero_months > 0
    }

    /// Strong month-to-month variation in the payment totals
    pub fn has_high_variation(&self) -> bool {
        self.variation_pct > 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::YearMonth;
    use approx::assert_relative_eq;

    #[test]
    fn test_annual_rollup_groups_by_year() {
        let mut monthly = BTreeMap::new();
        monthly.insert(YearMonth::new(2025, 11), 10.0);
        monthly.insert(YearMonth::new(2025, 12), 20.0);
        monthly.insert(YearMonth::new(2026, 1), 5.0);

        let annual = annual_rollup(&monthly, |ym| ym.year);
        assert_relative_eq!(annual[&2025], 30.0);
        assert_relative_eq!(annual[&2026], 5.0);
    }

    #[test]
    fn test_safe_ratio_guards_zero_denominator() {
        assert_relative_eq!(safe_ratio(50.0, 100.0), 0.5);
        assert_relative_eq!(safe_ratio(50.0, 0.0), 0.0);
        assert_relative_eq!(safe_ratio(50.0, -1.0), 0.0);
    }

    #[test]
    fn test_coherence_report_regular_payments() {
        let payments = vec![1000.0; 24];
        let report = CoherenceReport::from_monthly_payments(&payments);
        assert_eq!(report.month_count, 24);
        assert_eq!(report.zero_months, 0);
        assert_relative_eq!(report.mean, 1000.0);
        assert_relative_eq!(report.variation_pct, 0.0);
        assert!(!report.has_high_variation());
    }

    #[test]
    fn test_coherence_report_flags_gaps() {
        let payments = vec![1000.0, 0.0, 1000.0, 0.0];
        let report = CoherenceReport::from_monthly_payments(&payments);
        assert_eq!(report.zero_months, 2);
        assert!(report.has_zero_month_gap());
        assert!(report.has_high_variation());
    }

    #[test]
    fn test_coherence_report_empty() {
        let report = CoherenceReport::from_monthly_payments(&[]);
        assert_eq!(report.month_count, 0);
        assert_relative_eq!(report.mean, 0.0);
    }
}
