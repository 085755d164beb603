//! Entity store abstraction
//!
//! Every call carries the owner; implementations only read or write rows
//! whose `owner_id` matches it. A row belonging to another owner behaves
//! exactly like a missing row.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, Client, ClientPatch, NewAppointment,
    NewClient, NewService, NewTransaction, OwnerId, Profile, ProfilePatch, Service, ServicePatch,
    Transaction,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Row storage for the agenda tables
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short name used in logs
    fn backend_tag(&self) -> &'static str;

    /// Clients ordered by name
    async fn list_clients(&self, owner: OwnerId) -> StoreResult<Vec<Client>>;
    async fn insert_client(&self, owner: OwnerId, client: NewClient) -> StoreResult<Client>;
    async fn update_client(&self, owner: OwnerId, id: Uuid, patch: ClientPatch) -> StoreResult<()>;
    async fn delete_client(&self, owner: OwnerId, id: Uuid) -> StoreResult<()>;

    /// Services ordered by name
    async fn list_services(&self, owner: OwnerId) -> StoreResult<Vec<Service>>;
    async fn insert_service(&self, owner: OwnerId, service: NewService) -> StoreResult<Service>;
    async fn update_service(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: ServicePatch,
    ) -> StoreResult<()>;
    async fn delete_service(&self, owner: OwnerId, id: Uuid) -> StoreResult<()>;

    /// Appointments ordered by date then time, optionally for a single day
    async fn list_appointments(
        &self,
        owner: OwnerId,
        date: Option<NaiveDate>,
    ) -> StoreResult<Vec<Appointment>>;
    async fn get_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<Appointment>;
    async fn insert_appointment(
        &self,
        owner: OwnerId,
        appointment: NewAppointment,
    ) -> StoreResult<Appointment>;
    async fn update_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> StoreResult<()>;
    /// Move a `scheduled` appointment to `to` and return the status it had.
    /// Any other status is returned unchanged and nothing is written, so a
    /// terminal appointment never moves even when the caller's copy is stale.
    async fn transition_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        to: AppointmentStatus,
    ) -> StoreResult<AppointmentStatus>;
    async fn delete_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<()>;

    /// Transactions, newest date first, then newest insert first
    async fn list_transactions(&self, owner: OwnerId) -> StoreResult<Vec<Transaction>>;
    async fn insert_transaction(
        &self,
        owner: OwnerId,
        transaction: NewTransaction,
    ) -> StoreResult<Transaction>;
    async fn delete_transaction(&self, owner: OwnerId, id: Uuid) -> StoreResult<()>;

    async fn get_profile(&self, owner: OwnerId) -> StoreResult<Option<Profile>>;
    /// Insert the owner's profile on first save, update it afterwards
    async fn upsert_profile(&self, owner: OwnerId, patch: ProfilePatch) -> StoreResult<Profile>;
}
