//! Service catalog model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

use super::OwnerId;

/// A service offered by the business, with its list price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: Option<i32>,
}

impl NewService {
    pub fn validate(self) -> AgendaResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AgendaError::Validation("Service name is required".to_string()));
        }
        check_price(self.price)?;
        check_duration(self.duration_minutes)?;

        Ok(Self { name, ..self })
    }
}

/// Service update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
}

impl ServicePatch {
    pub fn validate(self) -> AgendaResult<Self> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AgendaError::Validation("Service name is required".to_string()));
            }
            other => other.map(|n| n.trim().to_string()),
        };
        if let Some(price) = self.price {
            check_price(price)?;
        }
        check_duration(self.duration_minutes)?;

        Ok(Self { name, ..self })
    }
}

fn check_price(price: Decimal) -> AgendaResult<()> {
    if price < Decimal::ZERO {
        return Err(AgendaError::Validation("Price cannot be negative".to_string()));
    }
    Ok(())
}

fn check_duration(duration: Option<i32>) -> AgendaResult<()> {
    match duration {
        Some(minutes) if minutes <= 0 => Err(AgendaError::Validation(
            "Duration must be a positive number of minutes".to_string(),
        )),
        _ => Ok(()),
    }
}
