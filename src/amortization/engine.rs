//! Loan amortization engine
//!
//! Turns a loan contract into a periodic schedule (constant annuity payment
//! split into interest and principal, truncated at payoff), posts its fees,
//! computes the inflation-adjusted parallel series, and consolidates all
//! loans into calendar-aligned daily, monthly, and annual views.
//!
//! Early-repayment penalties are counted with the fee columns; the repaid
//! amounts themselves are counted with payments and principal.

use chrono::Datelike;
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::calendar::{end_of_month, step_months, YearMonth};
use crate::consolidate::{annual_rollup, CoherenceReport};
use crate::contracts::{
    ContractError, DefermentKind, EarlyRepayment, EarlyRepaymentKind, FirstPaymentRule,
    LoanContract,
};
use crate::snapshot::GrowthAssumptions;
use super::fees::schedule_fees;
use super::schedule::{
    AmortizationRow, Deflator, LoanDayTotals, LoanPeriodTotals, LoanProjection, LoanResult,
    LoanTotals, RealValueRow,
};

/// Balance below which a schedule is considered paid off
const PAYOFF_EPSILON: f64 = 1e-9;

/// Projects debt-service cash flows for a set of loan contracts
#[derive(Debug, Default)]
pub struct LoanEngine {
    growth: GrowthAssumptions,
}

impl LoanEngine {
    pub fn new(growth: GrowthAssumptions) -> Self {
        Self { growth }
    }

    /// Amortize a single loan
    pub fn amortize(&self, loan: &LoanContract) -> Result<LoanProjection, ContractError> {
        loan.validate()?;
        Ok(project_loan(loan, &self.growth))
    }

    /// Project all loans and consolidate the results.
    ///
    /// An empty loan set yields an all-zero result. Per-loan schedules are
    /// independent and run in parallel; consolidation is sequential and
    /// deterministic.
    pub fn project(&self, loans: &[LoanContract]) -> Result<LoanResult, ContractError> {
        for loan in loans {
            loan.validate()?;
        }
        if loans.is_empty() {
            return Ok(LoanResult::default());
        }

        let projections: Vec<LoanProjection> =
            loans.par_iter().map(|loan| project_loan(loan, &self.growth)).collect();

        let consolidated_daily = consolidate_daily(&projections, &self.growth);
        let monthly = consolidate_monthly(loans, &projections);
        let annual = annual_rollup(&monthly, |ym| ym.year);

        let mut totals = LoanTotals::default();
        for projection in &projections {
            totals += projection.totals;
        }

        let monthly_payments: Vec<f64> = monthly.values().map(|m| m.payment).collect();
        let coherence = CoherenceReport::from_monthly_payments(&monthly_payments);
        let average_monthly_payment = coherence.mean;

        debug!(
            "loan projection: {} loans, {} schedule months, {} event days",
            projections.len(),
            monthly.len(),
            consolidated_daily.len()
        );

        Ok(LoanResult {
            totals,
            loan_count: loans.len(),
            average_monthly_payment,
            loans: projections,
            consolidated_daily,
            monthly,
            annual,
            coherence,
        })
    }
}

/// Constant annuity payment for `periods` payments of `balance` at `rate`
/// per period; straight-line division when the rate is zero.
fn annuity_payment(balance: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return balance;
    }
    if rate > 0.0 {
        let growth = (1.0 + rate).powi(periods as i32);
        balance * rate * growth / (growth - 1.0)
    } else {
        balance / periods as f64
    }
}

/// First payment date per the contract's timing rule
fn first_payment_date(loan: &LoanContract) -> chrono::NaiveDate {
    let start = loan.start_date;
    let months_per_period = loan.periodicity.months_per_period() as i32;

    match loan.first_payment {
        FirstPaymentRule::AtStart => start,
        FirstPaymentRule::NextPeriodStart => {
            // First day of the next period boundary (month, quarter,
            // half-year, or year depending on periodicity)
            let month = start.month() as i32;
            let boundary = months_per_period * ((month - 1) / months_per_period + 1) + 1;
            let (year, month) = if boundary > 12 {
                (start.year() + 1, (boundary - 12) as u32)
            } else {
                (start.year(), boundary as u32)
            };
            chrono::NaiveDate::from_ymd_opt(year, month, 1).expect("boundary month is valid")
        }
        FirstPaymentRule::EndOfFirstPeriod => {
            end_of_month(step_months(start, months_per_period - 1))
        }
    }
}

fn project_loan(loan: &LoanContract, growth: &GrowthAssumptions) -> LoanProjection {
    let deflator = Deflator::new(loan.start_date, growth);
    let schedule = build_schedule(loan);
    let fees = schedule_fees(loan, &deflator);

    let real_schedule: Vec<RealValueRow> = schedule
        .iter()
        .map(|row| RealValueRow {
            date: row.date,
            payment: deflator.real(row.payment, row.date),
            interest: deflator.real(row.interest, row.date),
            principal: deflator.real(row.principal, row.date),
            balance: deflator.real(row.balance, row.date),
        })
        .collect();

    let mut totals = LoanTotals::default();
    for row in &schedule {
        totals.payments += row.payment + row.early_repayment;
        totals.principal += row.principal + row.early_repayment;
        totals.interest += row.interest;
        totals.fees += row.penalty;
    }
    totals.fees += fees.iter().map(|f| f.amount).sum::<f64>();
    totals.cost = totals.payments + totals.fees;

    LoanProjection {
        label: loan.label.clone(),
        principal: loan.principal,
        annual_rate_pct: loan.annual_rate_pct,
        term_months: loan.term_months,
        start_date: loan.start_date,
        periodicity: loan.periodicity,
        schedule,
        fees,
        real_schedule,
        totals,
    }
}

/// Build the payment schedule for one loan.
///
/// Iterates the nominal periods, handling in order: early-repayment events
/// due at the period date, the deferment phase, then the standard annuity
/// split. The schedule is truncated at the first row where the balance
/// reaches zero.
fn build_schedule(loan: &LoanContract) -> Vec<AmortizationRow> {
    let rate = loan.period_rate();
    let period_count = loan.period_count();
    let months_per_period = loan.periodicity.months_per_period();
    let first_date = first_payment_date(loan);

    let deferment = loan.active_deferment();
    let deferred_periods = deferment
        .map(|d| (d.duration_months / months_per_period).min(period_count))
        .unwrap_or(0);

    let mut events: Vec<&EarlyRepayment> = loan.early_repayments.iter().collect();
    events.sort_by_key(|e| e.date);
    let mut next_event = 0;

    let mut schedule = Vec::with_capacity(period_count as usize);
    let mut balance = loan.principal;
    let mut payment = annuity_payment(balance, rate, period_count - deferred_periods);

    for period in 0..period_count {
        let date = step_months(first_date, (period * months_per_period) as i32);
        let repayment_periods_left = period_count - period.max(deferred_periods);

        // Early-repayment events due at or before this payment date
        let mut early_repayment = 0.0;
        let mut penalty = 0.0;
        let mut settled = false;
        while next_event < events.len() && events[next_event].date <= date {
            let event = events[next_event];
            next_event += 1;
            match event.kind {
                EarlyRepaymentKind::Partial => {
                    let repaid = event.amount.min(balance);
                    balance -= repaid;
                    early_repayment += repaid;
                    penalty += repaid * event.penalty_rate();
                    payment = annuity_payment(balance, rate, repayment_periods_left);
                }
                EarlyRepaymentKind::Total => {
                    let repaid = balance;
                    balance = 0.0;
                    early_repayment += repaid;
                    penalty += repaid * event.penalty_rate();
                    settled = true;
                }
            }
        }

        if settled || balance <= PAYOFF_EPSILON {
            schedule.push(AmortizationRow {
                date,
                payment: 0.0,
                interest: 0.0,
                principal: 0.0,
                balance: 0.0,
                early_repayment,
                penalty,
                capitalized_interest: 0.0,
            });
            break;
        }

        if period < deferred_periods {
            let kind = deferment.map(|d| d.kind).expect("deferred periods imply a deferment");
            let row = match kind {
                DefermentKind::Partial => {
                    // Interest-only payment; principal untouched
                    let interest = balance * rate;
                    AmortizationRow {
                        date,
                        payment: interest,
                        interest,
                        principal: 0.0,
                        balance,
                        early_repayment,
                        penalty,
                        capitalized_interest: 0.0,
                    }
                }
                DefermentKind::Total => {
                    // No payment; interest capitalized onto the balance
                    let accrued = balance * rate;
                    balance += accrued;
                    AmortizationRow {
                        date,
                        payment: 0.0,
                        interest: 0.0,
                        principal: 0.0,
                        balance,
                        early_repayment,
                        penalty,
                        capitalized_interest: accrued,
                    }
                }
            };
            schedule.push(row);

            if period + 1 == deferred_periods {
                payment = annuity_payment(balance, rate, period_count - deferred_periods);
            }
            continue;
        }

        let interest = balance * rate;
        let mut principal = payment - interest;
        let mut row_payment = payment;
        if principal > balance {
            // Final row: pay off exactly what remains
            principal = balance;
            row_payment = principal + interest;
        }
        balance -= principal;

        schedule.push(AmortizationRow {
            date,
            payment: row_payment,
            interest,
            principal,
            balance,
            early_repayment,
            penalty,
            capitalized_interest: 0.0,
        });

        if balance <= PAYOFF_EPSILON {
            break;
        }
    }

    schedule
}

/// Sum same-named columns across loans for every day carrying an event;
/// balance columns forward-fill each loan's last known balance.
fn consolidate_daily(
    projections: &[LoanProjection],
    growth: &GrowthAssumptions,
) -> BTreeMap<chrono::NaiveDate, LoanDayTotals> {
    let mut daily: BTreeMap<chrono::NaiveDate, LoanDayTotals> = BTreeMap::new();

    for projection in projections {
        let deflator = Deflator::new(projection.start_date, growth);
        for row in &projection.schedule {
            let entry = daily.entry(row.date).or_default();
            let payment = row.payment + row.early_repayment;
            let principal = row.principal + row.early_repayment;
            entry.payment += payment;
            entry.principal += principal;
            entry.interest += row.interest;
            entry.fees += row.penalty;
            entry.real_payment += deflator.real(payment, row.date);
            entry.real_principal += deflator.real(principal, row.date);
            entry.real_interest += deflator.real(row.interest, row.date);
            entry.real_fees += deflator.real(row.penalty, row.date);
        }
        for fee in &projection.fees {
            let entry = daily.entry(fee.date).or_default();
            entry.fees += fee.amount;
            entry.real_fees += fee.real_amount;
        }
    }

    // Balance columns need the full date set before they can be filled
    let dates: Vec<chrono::NaiveDate> = daily.keys().copied().collect();
    for date in dates {
        let mut balance = 0.0;
        let mut real_balance = 0.0;
        for projection in projections {
            let deflator = Deflator::new(projection.start_date, growth);
            let loan_balance = projection.balance_as_of(date);
            balance += loan_balance;
            real_balance += deflator.real(loan_balance, date);
        }
        let entry = daily.get_mut(&date).expect("date came from the map");
        entry.balance = balance;
        entry.real_balance = real_balance;
    }

    daily
}

/// Monthly sums over the span from the earliest loan start to the latest
/// nominal term end, zero-filled so payment-free months stay visible.
fn consolidate_monthly(
    loans: &[LoanContract],
    projections: &[LoanProjection],
) -> BTreeMap<YearMonth, LoanPeriodTotals> {
    let mut monthly = BTreeMap::new();

    let first = loans.iter().map(|l| YearMonth::from_date(l.start_date)).min();
    let last = loans
        .iter()
        .map(|l| YearMonth::from_date(step_months(l.start_date, l.term_months as i32)))
        .max();
    let (Some(first), Some(last)) = (first, last) else {
        return monthly;
    };

    for month in first.range_inclusive(last) {
        monthly.insert(month, LoanPeriodTotals::default());
    }
    for projection in projections {
        for row in &projection.schedule {
            let entry = monthly.entry(YearMonth::from_date(row.date)).or_default();
            entry.payment += row.payment + row.early_repayment;
            entry.principal += row.principal + row.early_repayment;
            entry.interest += row.interest;
            entry.fees += row.penalty;
        }
        for fee in &projection.fees {
            let entry = monthly.entry(YearMonth::from_date(fee.date)).or_default();
            entry.fees += fee.amount;
        }
    }

    monthly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{Deferment, LoanFees, Periodicity};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn loan(principal: f64, rate_pct: f64, term_months: u32) -> LoanContract {
        LoanContract {
            label: "Pret 1".to_string(),
            principal,
            annual_rate_pct: rate_pct,
            term_months,
            start_date: d(2025, 3, 10),
            periodicity: Periodicity::Monthly,
            first_payment: FirstPaymentRule::AtStart,
            fees: LoanFees::default(),
            deferment: None,
            early_repayments: Vec::new(),
        }
    }

    fn engine() -> LoanEngine {
        LoanEngine::new(GrowthAssumptions::default())
    }

    #[test]
    fn test_zero_rate_loan_is_straight_line() {
        // 120,000 at 0% over 120 months: 1000 per month, linear to zero
        let projection = engine().amortize(&loan(120_000.0, 0.0, 120)).unwrap();
        assert_eq!(projection.schedule.len(), 120);
        for (i, row) in projection.schedule.iter().enumerate() {
            assert_relative_eq!(row.payment, 1000.0);
            assert_relative_eq!(row.interest, 0.0);
            assert_relative_eq!(row.balance, 120_000.0 - 1000.0 * (i + 1) as f64);
        }
        assert_relative_eq!(projection.schedule.last().unwrap().balance, 0.0);
    }

    #[test]
    fn test_balance_invariant_and_payment_decomposition() {
        let projection = engine().amortize(&loan(200_000.0, 4.5, 240)).unwrap();
        let schedule = &projection.schedule;
        assert!(!schedule.is_empty());

        let rate = 0.045 / 12.0;
        let mut previous = 200_000.0;
        for row in schedule {
            // interest accrues on the balance before the row
            assert_relative_eq!(row.interest, previous * rate, max_relative = 1e-9);
            // payment splits exactly into interest + principal
            assert_relative_eq!(row.payment, row.interest + row.principal, epsilon = 1e-8);
            // balance is non-increasing
            assert!(row.balance <= previous + 1e-9);
            previous = row.balance;
        }

        let last = schedule.last().unwrap();
        assert_relative_eq!(last.balance, 0.0, epsilon = 1e-6);
        // last payment date is within the nominal term
        assert!(last.date <= step_months(d(2025, 3, 10), 240));
    }

    #[test]
    fn test_constant_payment_matches_annuity_formula() {
        let projection = engine().amortize(&loan(100_000.0, 6.0, 120)).unwrap();
        let rate: f64 = 0.06 / 12.0;
        let growth = (1.0 + rate).powi(120);
        let expected = 100_000.0 * rate * growth / (growth - 1.0);
        for row in &projection.schedule[..projection.schedule.len() - 1] {
            assert_relative_eq!(row.payment, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_quarterly_periodicity() {
        let mut contract = loan(100_000.0, 4.0, 120);
        contract.periodicity = Periodicity::Quarterly;
        let projection = engine().amortize(&contract).unwrap();

        // 120 months at quarterly periodicity: 40 periods, 3 months apart
        assert_eq!(projection.schedule.len(), 40);
        assert_eq!(projection.schedule[0].date, d(2025, 3, 10));
        assert_eq!(projection.schedule[1].date, d(2025, 6, 10));

        let rate = 0.04 / 4.0;
        assert_relative_eq!(
            projection.schedule[0].interest,
            100_000.0 * rate,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_first_payment_rules() {
        let mut contract = loan(50_000.0, 3.0, 60);
        contract.start_date = d(2025, 8, 20);

        contract.first_payment = FirstPaymentRule::AtStart;
        assert_eq!(first_payment_date(&contract), d(2025, 8, 20));

        contract.first_payment = FirstPaymentRule::NextPeriodStart;
        assert_eq!(first_payment_date(&contract), d(2025, 9, 1));

        contract.first_payment = FirstPaymentRule::EndOfFirstPeriod;
        assert_eq!(first_payment_date(&contract), d(2025, 8, 31));

        // Quarterly: next quarter starts in October; first period ends there too
        contract.periodicity = Periodicity::Quarterly;
        contract.first_payment = FirstPaymentRule::NextPeriodStart;
        assert_eq!(first_payment_date(&contract), d(2025, 10, 1));
        contract.first_payment = FirstPaymentRule::EndOfFirstPeriod;
        assert_eq!(first_payment_date(&contract), d(2025, 10, 31));

        // December start rolls the next monthly period into January
        contract.periodicity = Periodicity::Monthly;
        contract.first_payment = FirstPaymentRule::NextPeriodStart;
        contract.start_date = d(2025, 12, 5);
        assert_eq!(first_payment_date(&contract), d(2026, 1, 1));
    }

    #[test]
    fn test_partial_deferment_is_interest_only() {
        let mut contract = loan(100_000.0, 6.0, 120);
        contract.deferment = Some(Deferment {
            active: true,
            duration_months: 12,
            kind: DefermentKind::Partial,
        });
        let projection = engine().amortize(&contract).unwrap();

        let monthly_interest = 100_000.0 * 0.06 / 12.0;
        for row in &projection.schedule[..12] {
            assert_relative_eq!(row.payment, monthly_interest);
            assert_relative_eq!(row.principal, 0.0);
            assert_relative_eq!(row.balance, 100_000.0);
        }
        // Repayment resumes over the remaining 108 periods
        assert!(projection.schedule[12].principal > 0.0);
        assert_relative_eq!(
            projection.schedule.last().unwrap().balance,
            0.0,
            epsilon = 1e-6
        );
        assert_eq!(projection.schedule.len(), 120);
    }

    #[test]
    fn test_total_deferment_capitalizes_interest() {
        let mut contract = loan(100_000.0, 6.0, 120);
        contract.deferment = Some(Deferment {
            active: true,
            duration_months: 12,
            kind: DefermentKind::Total,
        });
        let projection = engine().amortize(&contract).unwrap();

        let rate: f64 = 0.06 / 12.0;
        for row in &projection.schedule[..12] {
            assert_relative_eq!(row.payment, 0.0);
            assert!(row.capitalized_interest > 0.0);
        }
        // Balance grew by one year of compounded monthly interest
        assert_relative_eq!(
            projection.schedule[11].balance,
            100_000.0 * (1.0 + rate).powi(12),
            max_relative = 1e-9
        );
        assert_relative_eq!(
            projection.schedule.last().unwrap().balance,
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_partial_early_repayment_reduces_cost() {
        let baseline = engine().amortize(&loan(100_000.0, 5.0, 240)).unwrap();

        let mut contract = loan(100_000.0, 5.0, 240);
        contract.early_repayments = vec![EarlyRepayment {
            amount: 20_000.0,
            date: d(2030, 3, 10),
            penalty_pct: 3.0,
            kind: EarlyRepaymentKind::Partial,
        }];
        let projection = engine().amortize(&contract).unwrap();

        let event_row = projection
            .schedule
            .iter()
            .find(|r| r.early_repayment > 0.0)
            .unwrap();
        assert_relative_eq!(event_row.early_repayment, 20_000.0);
        assert_relative_eq!(event_row.penalty, 600.0);

        // Less interest paid overall than without the event
        assert!(projection.totals.interest < baseline.totals.interest);
        assert_relative_eq!(
            projection.schedule.last().unwrap().balance,
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_total_early_repayment_truncates_schedule() {
        let mut contract = loan(100_000.0, 5.0, 240);
        contract.early_repayments = vec![EarlyRepayment {
            amount: 0.0,
            date: d(2027, 3, 10),
            penalty_pct: 3.0,
            kind: EarlyRepaymentKind::Total,
        }];
        let projection = engine().amortize(&contract).unwrap();

        let last = projection.schedule.last().unwrap();
        assert_eq!(last.date, d(2027, 3, 10));
        assert!(last.early_repayment > 0.0);
        assert_relative_eq!(last.balance, 0.0);
        assert!(projection.schedule.len() < 240);
    }

    #[test]
    fn test_multi_loan_consolidation_sums_columns() {
        let first = loan(120_000.0, 0.0, 120);
        let mut second = loan(60_000.0, 0.0, 60);
        second.label = "Pret 2".to_string();

        let result = engine().project(&[first, second]).unwrap();
        assert_eq!(result.loan_count, 2);

        // Both pay on the same dates: 1000 + 1000 for the first 60 periods
        let early = result.consolidated_daily[&d(2025, 3, 10)];
        assert_relative_eq!(early.payment, 2000.0);
        assert_relative_eq!(early.balance, 120_000.0 - 1000.0 + 60_000.0 - 1000.0);

        // After the short loan pays off, only the long one remains
        let late = result.consolidated_daily[&d(2031, 3, 10)];
        assert_relative_eq!(late.payment, 1000.0);

        assert_relative_eq!(result.totals.principal, 180_000.0, max_relative = 1e-9);
        assert_relative_eq!(result.totals.cost, result.totals.payments + result.totals.fees);
    }

    #[test]
    fn test_monthly_stats_and_average_payment() {
        let result = engine().project(&[loan(120_000.0, 0.0, 120)]).unwrap();

        // Span is start month through term-end month inclusive: 121 months
        assert_eq!(result.monthly.len(), 121);
        let march = result.monthly[&YearMonth::new(2025, 3)];
        assert_relative_eq!(march.payment, 1000.0);

        // 120 payments of 1000 over 121 months
        assert_relative_eq!(
            result.average_monthly_payment,
            120_000.0 / 121.0,
            max_relative = 1e-12
        );
        assert_eq!(result.coherence.zero_months, 1);
    }

    #[test]
    fn test_empty_input_yields_zero_result() {
        let result = engine().project(&[]).unwrap();
        assert_eq!(result.loan_count, 0);
        assert!(result.loans.is_empty());
        assert!(result.consolidated_daily.is_empty());
        assert_eq!(result.totals, LoanTotals::default());
        assert_relative_eq!(result.average_monthly_payment, 0.0);
    }

    #[test]
    fn test_invalid_principal_rejected_at_boundary() {
        let mut contract = loan(0.0, 5.0, 120);
        contract.principal = 0.0;
        let error = engine().project(&[contract]).unwrap_err();
        assert!(error.to_string().contains("principal"));
    }
}
