//! Daily overview for the business owner

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregation::PeriodTotals;
use crate::models::{Appointment, AppointmentStatus, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Today's appointments still to be served, earliest first
    pub pending: Vec<Appointment>,
    pub completed_count: usize,
    pub client_count: usize,
    pub totals: PeriodTotals,
}

impl DaySummary {
    /// `appointments` may cover any range; only those dated `today` count
    pub fn build(
        appointments: &[Appointment],
        transactions: &[Transaction],
        client_count: usize,
        today: NaiveDate,
    ) -> Self {
        let todays = appointments.iter().filter(|a| a.date == today);

        let mut pending: Vec<Appointment> = todays
            .clone()
            .filter(|a| a.status == AppointmentStatus::Scheduled)
            .cloned()
            .collect();
        pending.sort_by_key(|a| a.time);

        let completed_count = todays
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count();

        Self {
            date: today,
            pending,
            completed_count,
            client_count,
            totals: PeriodTotals::compute(transactions, today),
        }
    }
}
