//! Business profile and settings

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

use super::{OwnerId, clearable_text, explicit_null};

/// A stored profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub working_hours_start: Option<NaiveTime>,
    pub working_hours_end: Option<NaiveTime>,
    pub working_days: Option<Vec<Weekday>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settings as shown to the owner, with defaults filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub working_hours_start: NaiveTime,
    pub working_hours_end: NaiveTime,
    pub working_days: Vec<Weekday>,
    /// Whether a profile row exists yet
    pub persisted: bool,
}

impl ProfileSettings {
    pub fn default_start() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
    }

    pub fn default_end() -> NaiveTime {
        NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default()
    }

    /// Build the settings view from an optional stored row
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        match profile {
            None => Self::default(),
            Some(p) => Self {
                business_name: p.business_name.clone(),
                phone: p.phone.clone(),
                working_hours_start: p.working_hours_start.unwrap_or_else(Self::default_start),
                working_hours_end: p.working_hours_end.unwrap_or_else(Self::default_end),
                working_days: p.working_days.clone().unwrap_or_default(),
                persisted: true,
            },
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            business_name: None,
            phone: None,
            working_hours_start: Self::default_start(),
            working_hours_end: Self::default_end(),
            working_days: Vec::new(),
            persisted: false,
        }
    }
}

/// Profile update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    /// `null` or blank text clears the business name
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    pub working_hours_start: Option<NaiveTime>,
    pub working_hours_end: Option<NaiveTime>,
    pub working_days: Option<Vec<Weekday>>,
}

impl ProfilePatch {
    /// Validate against the settings currently in effect
    pub fn validate(self, current: &ProfileSettings) -> AgendaResult<Self> {
        let start = self.working_hours_start.unwrap_or(current.working_hours_start);
        let end = self.working_hours_end.unwrap_or(current.working_hours_end);
        if start >= end {
            return Err(AgendaError::Validation(
                "Working hours must start before they end".to_string(),
            ));
        }

        let working_days = self.working_days.map(|mut days| {
            days.sort_by_key(|d| d.num_days_from_monday());
            days.dedup();
            days
        });

        Ok(Self {
            business_name: clearable_text(self.business_name),
            phone: clearable_text(self.phone),
            working_days,
            ..self
        })
    }
}
