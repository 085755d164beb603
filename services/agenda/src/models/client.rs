//! Client model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

use super::{OwnerId, clearable_text, explicit_null, non_blank};

/// A customer of the business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl NewClient {
    pub fn validate(self) -> AgendaResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AgendaError::Validation("Client name is required".to_string()));
        }

        Ok(Self {
            name,
            phone: non_blank(self.phone),
            notes: non_blank(self.notes),
        })
    }
}

/// Client update payload; `null` or blank text clears phone and notes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl ClientPatch {
    pub fn validate(self) -> AgendaResult<Self> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AgendaError::Validation("Client name is required".to_string()));
            }
            other => other.map(|n| n.trim().to_string()),
        };

        Ok(Self {
            name,
            phone: clearable_text(self.phone),
            notes: clearable_text(self.notes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contact_fields_are_stored_as_absent() {
        let new = NewClient {
            name: " Ana ".to_string(),
            phone: Some("  ".to_string()),
            notes: None,
        }
        .validate()
        .unwrap();
        assert_eq!(new.name, "Ana");
        assert_eq!(new.phone, None);

        let patch = ClientPatch {
            phone: Some(Some("  ".to_string())),
            notes: Some(Some(" prefers mornings ".to_string())),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.phone, Some(None));
        assert_eq!(patch.notes, Some(Some("prefers mornings".to_string())));
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = ClientPatch {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(AgendaError::Validation(_))));
    }
}
