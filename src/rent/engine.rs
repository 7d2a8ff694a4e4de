//! Rent projection engine
//!
//! Projects each lease month by month over its contract length, then merges
//! the per-lease series into a calendar-aligned consolidated view. All
//! statistics derive from the monthly period records, never from a daily
//! breakdown, so month-length differences cannot distort them.

use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::calendar::YearMonth;
use crate::consolidate::annual_rollup;
use crate::contracts::{ContractError, LeaseContract};
use crate::indexation::{indexation_factor, reference_index_factor};
use super::series::{LeaseProjection, MonthlyAverages, PeriodRecord, RentResult, RentTotals};

/// Projects rental cash flows for a set of lease contracts
#[derive(Debug, Default)]
pub struct RentEngine;

impl RentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Project all leases and consolidate the results.
    ///
    /// An empty lease set yields an all-zero result. Per-lease projections
    /// are independent and run in parallel; consolidation is sequential and
    /// deterministic.
    pub fn project(&self, leases: &[LeaseContract]) -> Result<RentResult, ContractError> {
        for lease in leases {
            lease.validate()?;
        }
        if leases.is_empty() {
            return Ok(RentResult::default());
        }

        let projections: Vec<LeaseProjection> =
            leases.par_iter().map(project_lease).collect();

        let consolidated_monthly = consolidate_monthly(&projections);
        let annual = annual_rollup(&consolidated_monthly, |ym| ym.year);

        let mut totals = RentTotals::default();
        for row in consolidated_monthly.values() {
            totals += *row;
        }

        debug!(
            "rent projection: {} leases, {} consolidated months",
            projections.len(),
            consolidated_monthly.len()
        );

        Ok(RentResult {
            totals,
            lease_count: leases.len(),
            leases: projections,
            consolidated_monthly,
            annual,
        })
    }
}

/// Project a single lease over its month grid, inclusive of both the start
/// month and the month of the derived end date.
fn project_lease(lease: &LeaseContract) -> LeaseProjection {
    let occupancy = lease.occupancy();
    let gli_rate = lease.gli_rate();
    let end_date = lease.end_date();

    let first = YearMonth::from_date(lease.start_date);
    let last = YearMonth::from_date(end_date);

    let mut records = Vec::new();
    let mut totals = RentTotals::default();
    let mut annual: BTreeMap<i32, RentTotals> = BTreeMap::new();

    for month in first.range_inclusive(last) {
        let idx_factor = indexation_factor(lease, month.year, month.month);
        let ref_factor = reference_index_factor(lease, month.year, month.month);

        let base = lease.monthly_rent * occupancy;
        let indexed = lease.monthly_rent * idx_factor * occupancy;
        let reference_indexed = lease.monthly_rent * ref_factor * occupancy;
        let charges = lease.monthly_charges * occupancy;
        let gross = indexed + charges;
        let insurance = gross * gli_rate;
        let net = gross - insurance;

        let record = PeriodRecord {
            month,
            base,
            indexed,
            reference_indexed,
            charges,
            gross,
            insurance,
            net,
            occupancy_pct: lease.occupancy_pct,
            indexation_factor: idx_factor,
            reference_factor: ref_factor,
        };

        totals.add_record(&record);
        annual.entry(month.year).or_default().add_record(&record);
        records.push(record);
    }

    let month_count = records.len() as u32;
    let divisor = month_count.max(1) as f64;
    let averages = MonthlyAverages {
        base: totals.base / divisor,
        indexed: totals.indexed / divisor,
        reference_indexed: totals.reference_indexed / divisor,
        charges: totals.charges / divisor,
    };

    LeaseProjection {
        label: lease.label.clone(),
        start_date: lease.start_date,
        end_date,
        records,
        totals,
        annual,
        month_count,
        averages,
    }
}

/// Outer-join merge of the per-lease monthly series over the full span of
/// the projection; months where no lease is active carry zeros.
fn consolidate_monthly(projections: &[LeaseProjection]) -> BTreeMap<YearMonth, RentTotals> {
    let mut merged = BTreeMap::new();

    let first = projections.iter().filter_map(|p| p.records.first()).map(|r| r.month).min();
    let last = projections.iter().filter_map(|p| p.records.last()).map(|r| r.month).max();
    let (Some(first), Some(last)) = (first, last) else {
        return merged;
    };

    for month in first.range_inclusive(last) {
        merged.insert(month, RentTotals::default());
    }
    for projection in projections {
        for record in &projection.records {
            merged
                .entry(record.month)
                .or_default()
                .add_record(record);
        }
    }

    merged
}
