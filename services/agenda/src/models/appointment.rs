//! Appointment model and its status state machine

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

use super::{OwnerId, clearable_text, explicit_null};

/// Appointment status
///
/// `Scheduled` is the only state with outgoing transitions; `Completed` and
/// `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    /// Check a transition against the state machine
    pub fn transition(self, to: AppointmentStatus) -> AgendaResult<AppointmentStatus> {
        match (self, to) {
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed)
            | (AppointmentStatus::Scheduled, AppointmentStatus::Canceled) => Ok(to),
            (from, to) => Err(AgendaError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "canceled" => Ok(AppointmentStatus::Canceled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// A booked appointment
///
/// `client_name`, `service_name` and `price` are snapshots taken when the
/// appointment was booked. They are never refreshed from the client or
/// service rows afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub client_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub price: Decimal,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Description used for the ledger entry posted on completion
    pub fn ledger_description(&self) -> String {
        format!("{} - {}", self.service_name, self.client_name)
    }
}

/// Validated appointment ready to be inserted with status `scheduled`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub client_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub price: Decimal,
    pub notes: Option<String>,
}

/// Partial appointment update
///
/// Status is deliberately absent: it only moves through complete/cancel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub service_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub price: Option<Decimal>,
    /// `null` or blank text clears the notes
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == AppointmentPatch::default()
    }

    pub fn validate(self) -> AgendaResult<Self> {
        let client_name = required_name(self.client_name, "Client name")?;
        let service_name = required_name(self.service_name, "Service name")?;
        if matches!(self.price, Some(price) if price < Decimal::ZERO) {
            return Err(AgendaError::Validation("Price cannot be negative".to_string()));
        }

        Ok(Self {
            client_name,
            service_name,
            notes: clearable_text(self.notes),
            ..self
        })
    }

    /// Apply the patch to an existing appointment
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(id) = self.client_id {
            appointment.client_id = Some(id);
        }
        if let Some(id) = self.service_id {
            appointment.service_id = Some(id);
        }
        if let Some(name) = &self.client_name {
            appointment.client_name = name.clone();
        }
        if let Some(name) = &self.service_name {
            appointment.service_name = name.clone();
        }
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(time) = self.time {
            appointment.time = time;
        }
        if let Some(price) = self.price {
            appointment.price = price;
        }
        if let Some(notes) = &self.notes {
            appointment.notes = notes.clone();
        }
    }
}

fn required_name(value: Option<String>, field: &str) -> AgendaResult<Option<String>> {
    match value {
        Some(name) if name.trim().is_empty() => {
            Err(AgendaError::Validation(format!("{} is required", field)))
        }
        other => Ok(other.map(|n| n.trim().to_string())),
    }
}
