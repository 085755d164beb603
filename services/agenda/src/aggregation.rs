//! Cash totals over calendar windows
//!
//! Totals are signed sums: credits add, debits subtract. Arithmetic is exact
//! decimal, so the result does not depend on the order of the input.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Monday through Sunday of the week containing `day`
    pub fn week_of(day: NaiveDate) -> Self {
        let start = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// First through last day of the month containing `day`
    pub fn month_of(day: NaiveDate) -> Self {
        let start = day.with_day(1).unwrap_or(day);
        let next_month = if day.month() == 12 {
            NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1)
        };
        let end = next_month.and_then(|d| d.pred_opt()).unwrap_or(day);

        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Signed sum of the transactions dated inside `window`
pub fn total(transactions: &[Transaction], window: Window) -> Decimal {
    transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .map(Transaction::signed_amount)
        .sum()
}

/// Balance for today, this week and this month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub today: Decimal,
    pub week: Decimal,
    pub month: Decimal,
}

impl PeriodTotals {
    pub fn compute(transactions: &[Transaction], today: NaiveDate) -> Self {
        Self {
            today: total(transactions, Window::day(today)),
            week: total(transactions, Window::week_of(today)),
            month: total(transactions, Window::month_of(today)),
        }
    }
}
