//! Cash ledger entries

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

use super::{Appointment, OwnerId};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money in
    Credit,
    /// Money out
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// Apply the sign of this kind to a non-negative amount
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub appointment_id: Option<Uuid>,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Ledger entry ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub appointment_id: Option<Uuid>,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date: NaiveDate,
}

impl NewTransaction {
    /// The credit posted when an appointment is completed
    pub fn for_completed(appointment: &Appointment) -> Self {
        Self {
            appointment_id: Some(appointment.id),
            description: appointment.ledger_description(),
            amount: appointment.price,
            kind: TransactionKind::Credit,
            date: appointment.date,
        }
    }
}

/// Manual ledger entry as typed by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date: Option<NaiveDate>,
}

impl TransactionInput {
    /// Validate and date the entry, defaulting to `today`
    pub fn into_new(self, today: NaiveDate) -> AgendaResult<NewTransaction> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(AgendaError::Validation("Description is required".to_string()));
        }
        if self.amount < Decimal::ZERO {
            return Err(AgendaError::Validation(
                "Amount cannot be negative; use a debit instead".to_string(),
            ));
        }

        Ok(NewTransaction {
            appointment_id: None,
            description,
            amount: self.amount,
            kind: self.kind,
            date: self.date.unwrap_or(today),
        })
    }
}
