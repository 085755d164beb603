//! Domain models for the agenda service

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod appointment;
pub mod client;
pub mod profile;
pub mod service;
pub mod transaction;

pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};
pub use client::{Client, ClientPatch, NewClient};
pub use profile::{Profile, ProfilePatch, ProfileSettings};
pub use service::{NewService, Service, ServicePatch};
pub use transaction::{NewTransaction, Transaction, TransactionInput, TransactionKind};

/// Identity of the business owner every row is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for OwnerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trim a free-text field, mapping blank input to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Patch fields that can be cleared are `Option<Option<_>>`: a missing field
/// leaves the value alone, `null` clears it. Plain `Option` deserialization
/// folds both into `None`, so the outer layer is restored here.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Normalize a clearable free-text field; blank text clears it
pub(crate) fn clearable_text(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(non_blank)
}
