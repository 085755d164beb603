//! In-process entity store
//!
//! Backs the `memory` store backend and the test suites. Counts every call
//! and can be told to fail a named operation, which is how the tests exercise
//! partial failures.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EntityStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, Client, ClientPatch, NewAppointment,
    NewClient, NewService, NewTransaction, OwnerId, Profile, ProfilePatch, Service, ServicePatch,
    Transaction,
};

#[derive(Default)]
pub struct MemoryStore {
    clients: Mutex<Vec<Client>>,
    services: Mutex<Vec<Service>>,
    appointments: Mutex<Vec<Appointment>>,
    transactions: Mutex<Vec<Transaction>>,
    profiles: Mutex<Vec<Profile>>,
    failures: Mutex<HashMap<&'static str, String>>,
    calls: AtomicU64,
    list_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of store calls served so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of `list_*` calls served so far
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Make every call to `operation` fail with `message` until cleared
    pub async fn fail(&self, operation: &'static str, message: impl Into<String>) {
        self.failures.lock().await.insert(operation, message.into());
    }

    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
    }

    /// Every transaction row regardless of owner
    pub async fn all_transactions(&self) -> Vec<Transaction> {
        self.transactions.lock().await.clone()
    }

    async fn enter(&self, operation: &'static str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if operation.starts_with("list_") {
            self.list_calls.fetch_add(1, Ordering::Relaxed);
        }
        match self.failures.lock().await.get(operation) {
            Some(message) => Err(StoreError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

fn owned_mut<'a, T>(
    rows: &'a mut [T],
    owner: OwnerId,
    id: Uuid,
    key: impl Fn(&T) -> (OwnerId, Uuid),
) -> StoreResult<&'a mut T> {
    rows.iter_mut()
        .find(|row| key(row) == (owner, id))
        .ok_or(StoreError::NotFound)
}

fn remove_owned<T>(
    rows: &mut Vec<T>,
    owner: OwnerId,
    id: Uuid,
    key: impl Fn(&T) -> (OwnerId, Uuid),
) -> StoreResult<()> {
    let before = rows.len();
    rows.retain(|row| key(row) != (owner, id));
    if rows.len() == before {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_clients(&self, owner: OwnerId) -> StoreResult<Vec<Client>> {
        self.enter("list_clients").await?;
        let mut rows: Vec<Client> = self
            .clients
            .lock()
            .await
            .iter()
            .filter(|c| c.owner_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_client(&self, owner: OwnerId, client: NewClient) -> StoreResult<Client> {
        self.enter("insert_client").await?;
        let now = Utc::now();
        let row = Client {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: client.name,
            phone: client.phone,
            notes: client.notes,
            created_at: now,
            updated_at: now,
        };
        self.clients.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update_client(&self, owner: OwnerId, id: Uuid, patch: ClientPatch) -> StoreResult<()> {
        self.enter("update_client").await?;
        let mut rows = self.clients.lock().await;
        let row = owned_mut(&mut rows, owner, id, |c| (c.owner_id, c.id))?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(phone) = patch.phone {
            row.phone = phone;
        }
        if let Some(notes) = patch.notes {
            row.notes = notes;
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_client(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        self.enter("delete_client").await?;
        remove_owned(&mut *self.clients.lock().await, owner, id, |c| {
            (c.owner_id, c.id)
        })
    }

    async fn list_services(&self, owner: OwnerId) -> StoreResult<Vec<Service>> {
        self.enter("list_services").await?;
        let mut rows: Vec<Service> = self
            .services
            .lock()
            .await
            .iter()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_service(&self, owner: OwnerId, service: NewService) -> StoreResult<Service> {
        self.enter("insert_service").await?;
        let now = Utc::now();
        let row = Service {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: service.name,
            price: service.price,
            duration_minutes: service.duration_minutes,
            created_at: now,
            updated_at: now,
        };
        self.services.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update_service(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: ServicePatch,
    ) -> StoreResult<()> {
        self.enter("update_service").await?;
        let mut rows = self.services.lock().await;
        let row = owned_mut(&mut rows, owner, id, |s| (s.owner_id, s.id))?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(price) = patch.price {
            row.price = price;
        }
        if let Some(duration) = patch.duration_minutes {
            row.duration_minutes = Some(duration);
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_service(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        self.enter("delete_service").await?;
        remove_owned(&mut *self.services.lock().await, owner, id, |s| {
            (s.owner_id, s.id)
        })
    }

    async fn list_appointments(
        &self,
        owner: OwnerId,
        date: Option<NaiveDate>,
    ) -> StoreResult<Vec<Appointment>> {
        self.enter("list_appointments").await?;
        let mut rows: Vec<Appointment> = self
            .appointments
            .lock()
            .await
            .iter()
            .filter(|a| a.owner_id == owner)
            .filter(|a| date.is_none_or(|d| a.date == d))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.time));
        Ok(rows)
    }

    async fn get_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<Appointment> {
        self.enter("get_appointment").await?;
        self.appointments
            .lock()
            .await
            .iter()
            .find(|a| a.owner_id == owner && a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_appointment(
        &self,
        owner: OwnerId,
        appointment: NewAppointment,
    ) -> StoreResult<Appointment> {
        self.enter("insert_appointment").await?;
        let now = Utc::now();
        let row = Appointment {
            id: Uuid::new_v4(),
            owner_id: owner,
            client_id: appointment.client_id,
            service_id: appointment.service_id,
            client_name: appointment.client_name,
            service_name: appointment.service_name,
            date: appointment.date,
            time: appointment.time,
            price: appointment.price,
            status: AppointmentStatus::Scheduled,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
        };
        self.appointments.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> StoreResult<()> {
        self.enter("update_appointment").await?;
        let mut rows = self.appointments.lock().await;
        let row = owned_mut(&mut rows, owner, id, |a| (a.owner_id, a.id))?;
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn transition_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        to: AppointmentStatus,
    ) -> StoreResult<AppointmentStatus> {
        self.enter("transition_appointment").await?;
        let mut rows = self.appointments.lock().await;
        let row = owned_mut(&mut rows, owner, id, |a| (a.owner_id, a.id))?;
        let from = row.status;
        if from == AppointmentStatus::Scheduled {
            row.status = to;
            row.updated_at = Utc::now();
        }
        Ok(from)
    }

    async fn delete_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        self.enter("delete_appointment").await?;
        remove_owned(&mut *self.appointments.lock().await, owner, id, |a| {
            (a.owner_id, a.id)
        })
    }

    async fn list_transactions(&self, owner: OwnerId) -> StoreResult<Vec<Transaction>> {
        self.enter("list_transactions").await?;
        let mut rows: Vec<Transaction> = self
            .transactions
            .lock()
            .await
            .iter()
            .filter(|t| t.owner_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(rows)
    }

    async fn insert_transaction(
        &self,
        owner: OwnerId,
        transaction: NewTransaction,
    ) -> StoreResult<Transaction> {
        self.enter("insert_transaction").await?;
        let row = Transaction {
            id: Uuid::new_v4(),
            owner_id: owner,
            appointment_id: transaction.appointment_id,
            description: transaction.description,
            amount: transaction.amount,
            kind: transaction.kind,
            date: transaction.date,
            created_at: Utc::now(),
        };
        self.transactions.lock().await.push(row.clone());
        Ok(row)
    }

    async fn delete_transaction(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        self.enter("delete_transaction").await?;
        remove_owned(&mut *self.transactions.lock().await, owner, id, |t| {
            (t.owner_id, t.id)
        })
    }

    async fn get_profile(&self, owner: OwnerId) -> StoreResult<Option<Profile>> {
        self.enter("get_profile").await?;
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .find(|p| p.owner_id == owner)
            .cloned())
    }

    async fn upsert_profile(&self, owner: OwnerId, patch: ProfilePatch) -> StoreResult<Profile> {
        self.enter("upsert_profile").await?;
        let now = Utc::now();
        let mut rows = self.profiles.lock().await;
        let index = match rows.iter().position(|p| p.owner_id == owner) {
            Some(index) => index,
            None => {
                rows.push(Profile {
                    id: Uuid::new_v4(),
                    owner_id: owner,
                    business_name: None,
                    phone: None,
                    working_hours_start: None,
                    working_hours_end: None,
                    working_days: None,
                    created_at: now,
                    updated_at: now,
                });
                rows.len() - 1
            }
        };

        let row = &mut rows[index];
        if let Some(name) = patch.business_name {
            row.business_name = name;
        }
        if let Some(phone) = patch.phone {
            row.phone = phone;
        }
        if let Some(start) = patch.working_hours_start {
            row.working_hours_start = Some(start);
        }
        if let Some(end) = patch.working_hours_end {
            row.working_hours_end = Some(end);
        }
        if let Some(days) = patch.working_days {
            row.working_days = Some(days);
        }
        row.updated_at = now;
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn owner() -> OwnerId {
        OwnerId(Uuid::new_v4())
    }

    fn appointment_on(day: u32, hour: u32) -> NewAppointment {
        NewAppointment {
            client_id: None,
            service_id: None,
            client_name: "Ana".to_string(),
            service_name: "Haircut".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            price: Decimal::new(5000, 2),
            notes: None,
        }
    }

    #[tokio::test]
    async fn rows_are_isolated_per_owner() {
        let store = MemoryStore::new();
        let (alice, bob) = (owner(), owner());

        let appt = store
            .insert_appointment(alice, appointment_on(12, 9))
            .await
            .unwrap();

        assert!(store.list_appointments(bob, None).await.unwrap().is_empty());
        assert!(matches!(
            store.get_appointment(bob, appt.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_appointment(bob, appt.id).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.list_appointments(alice, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn appointments_sorted_by_date_then_time() {
        let store = MemoryStore::new();
        let me = owner();
        store.insert_appointment(me, appointment_on(13, 9)).await.unwrap();
        store.insert_appointment(me, appointment_on(12, 15)).await.unwrap();
        store.insert_appointment(me, appointment_on(12, 8)).await.unwrap();

        let hours: Vec<_> = store
            .list_appointments(me, None)
            .await
            .unwrap()
            .iter()
            .map(|a| (a.date.to_string(), a.time.to_string()))
            .collect();
        assert_eq!(
            hours,
            vec![
                ("2024-06-12".to_string(), "08:00:00".to_string()),
                ("2024-06-12".to_string(), "15:00:00".to_string()),
                ("2024-06-13".to_string(), "09:00:00".to_string()),
            ]
        );

        let day = NaiveDate::from_ymd_opt(2024, 6, 13);
        assert_eq!(store.list_appointments(me, day).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_scheduled_appointments_transition() {
        let store = MemoryStore::new();
        let me = owner();
        let appt = store.insert_appointment(me, appointment_on(12, 9)).await.unwrap();

        let from = store
            .transition_appointment(me, appt.id, AppointmentStatus::Canceled)
            .await
            .unwrap();
        assert_eq!(from, AppointmentStatus::Scheduled);

        let from = store
            .transition_appointment(me, appt.id, AppointmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(from, AppointmentStatus::Canceled);

        let stored = store.get_appointment(me, appt.id).await.unwrap();
        assert_eq!(stored.status, AppointmentStatus::Canceled);

        assert!(matches!(
            store
                .transition_appointment(owner(), appt.id, AppointmentStatus::Completed)
                .await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn patches_can_clear_contact_fields() {
        let store = MemoryStore::new();
        let me = owner();
        let client = store
            .insert_client(
                me,
                NewClient {
                    name: "Ana".to_string(),
                    phone: Some("+55 11 9999".to_string()),
                    notes: Some("prefers mornings".to_string()),
                },
            )
            .await
            .unwrap();

        store
            .update_client(
                me,
                client.id,
                ClientPatch {
                    phone: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let clients = store.list_clients(me).await.unwrap();
        assert_eq!(clients[0].phone, None);
        assert_eq!(clients[0].notes.as_deref(), Some("prefers mornings"));
    }

    #[tokio::test]
    async fn injected_failures_are_counted_and_reported() {
        let store = MemoryStore::new();
        store.fail("list_clients", "connection reset").await;

        let err = store.list_clients(owner()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(store.calls(), 1);
        assert_eq!(store.list_calls(), 1);

        store.clear_failures().await;
        assert!(store.list_clients(owner()).await.is_ok());
    }
}
