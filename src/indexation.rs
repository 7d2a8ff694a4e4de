//! Indexation and reference-index factor calculations
//!
//! Both factors are compounding multipliers applied to the base monthly
//! rent, always >= 1.0. The custom indexation is gated by the contract's
//! frequency (a cycle every N years); the reference index (IRL) has no
//! frequency gate and compounds once per elapsed year. Each series has its
//! own timing mode deciding when within the year a new cycle takes effect.

use chrono::Datelike;

use crate::calendar::anniversary_in_year;
use crate::contracts::{IndexationMode, LeaseContract};

/// Compounding multiplier from the lease's custom indexation policy for the
/// given calendar month.
///
/// Returns 1.0 when the frequency or rate is not positive. Otherwise the
/// number of applied cycles is `floor(elapsed_years / frequency)`, with no
/// cycle before `elapsed_years` reaches the frequency. Calendar-year mode
/// applies a new cycle from January of the qualifying year (a frequency that
/// cleanly divides the elapsed years qualifies that same year, not the
/// next); anniversary mode applies it from the contract's start-month
/// anniversary.
pub fn indexation_factor(lease: &LeaseContract, year: i32, month: u32) -> f64 {
    let frequency = lease.index_frequency_years;
    let rate = lease.index_rate();
    if frequency == 0 || rate <= 0.0 {
        return 1.0;
    }

    let start = lease.start_date;
    let cycles = match lease.index_mode {
        IndexationMode::CalendarYear => {
            let elapsed_years = year - start.year();
            if elapsed_years < frequency as i32 {
                0
            } else {
                elapsed_years as u32 / frequency
            }
        }
        IndexationMode::Anniversary => {
            let mut cycles = 0u32;
            for test_year in start.year()..=year {
                let years_since_start = test_year - start.year();
                if years_since_start <= 0 || years_since_start as u32 % frequency != 0 {
                    continue;
                }
                let anniversary = anniversary_in_year(start, test_year);
                if year > test_year || (year == test_year && month >= anniversary.month()) {
                    cycles += 1;
                }
            }
            cycles
        }
    };

    (1.0 + rate).powi(cycles as i32)
}

/// Compounding multiplier from the lease's reference index (IRL) for the
/// given calendar month.
///
/// No frequency gate: the index compounds once per elapsed year. In
/// calendar-year mode a year counts from its January; in anniversary mode a
/// year counts once the start-month anniversary has been reached, strictly
/// after the start year.
pub fn reference_index_factor(lease: &LeaseContract, year: i32, month: u32) -> f64 {
    let rate = lease.reference_rate();
    if rate <= 0.0 {
        return 1.0;
    }

    let start = lease.start_date;
    let years = match lease.reference_mode {
        IndexationMode::CalendarYear => (year - start.year()).max(0) as u32,
        IndexationMode::Anniversary => {
            let mut years = 0u32;
            for test_year in (start.year() + 1)..=year {
                let anniversary = anniversary_in_year(start, test_year);
                if year > test_year || (year == test_year && month >= anniversary.month()) {
                    years += 1;
                }
            }
            years
        }
    };

    (1.0 + rate).powi(years as i32)
}
