//! PostgreSQL entity store

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::EntityStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, Client, ClientPatch, NewAppointment,
    NewClient, NewService, NewTransaction, OwnerId, Profile, ProfilePatch, Service, ServicePatch,
    Transaction, TransactionKind,
};

const CLIENT_COLUMNS: &str = "id, owner_id, name, phone, notes, created_at, updated_at";
const SERVICE_COLUMNS: &str =
    "id, owner_id, name, price, duration_minutes, created_at, updated_at";
const APPOINTMENT_COLUMNS: &str = "id, owner_id, client_id, service_id, client_name, \
     service_name, date, time, price, status, notes, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, owner_id, appointment_id, description, amount, type, date, created_at";
const PROFILE_COLUMNS: &str = "id, owner_id, business_name, phone, working_hours_start, \
     working_hours_end, working_days, created_at, updated_at";

/// Entity store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DatabaseError::Migration)?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn expect_one(rows_affected: u64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Split a clearable patch field into "assign?" and the value to assign
fn assignment<T>(value: Option<Option<T>>) -> (bool, Option<T>) {
    (value.is_some(), value.flatten())
}

fn client_from_row(row: &PgRow) -> Client {
    Client {
        id: row.get("id"),
        owner_id: OwnerId(row.get("owner_id")),
        name: row.get("name"),
        phone: row.get("phone"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn service_from_row(row: &PgRow) -> Service {
    Service {
        id: row.get("id"),
        owner_id: OwnerId(row.get("owner_id")),
        name: row.get("name"),
        price: row.get("price"),
        duration_minutes: row.get("duration_minutes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn appointment_from_row(row: &PgRow) -> StoreResult<Appointment> {
    let status: String = row.get("status");
    Ok(Appointment {
        id: row.get("id"),
        owner_id: OwnerId(row.get("owner_id")),
        client_id: row.get("client_id"),
        service_id: row.get("service_id"),
        client_name: row.get("client_name"),
        service_name: row.get("service_name"),
        date: row.get("date"),
        time: row.get("time"),
        price: row.get("price"),
        status: status.parse().map_err(StoreError::Corrupt)?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn transaction_from_row(row: &PgRow) -> StoreResult<Transaction> {
    let kind: String = row.get("type");
    Ok(Transaction {
        id: row.get("id"),
        owner_id: OwnerId(row.get("owner_id")),
        appointment_id: row.get("appointment_id"),
        description: row.get("description"),
        amount: row.get("amount"),
        kind: kind.parse::<TransactionKind>().map_err(StoreError::Corrupt)?,
        date: row.get("date"),
        created_at: row.get("created_at"),
    })
}

fn profile_from_row(row: &PgRow) -> StoreResult<Profile> {
    let days: Option<Vec<String>> = row.get("working_days");
    let working_days = days
        .map(|days| {
            days.iter()
                .map(|d| {
                    d.parse::<Weekday>()
                        .map_err(|_| StoreError::Corrupt(format!("unknown weekday '{}'", d)))
                })
                .collect::<StoreResult<Vec<_>>>()
        })
        .transpose()?;

    Ok(Profile {
        id: row.get("id"),
        owner_id: OwnerId(row.get("owner_id")),
        business_name: row.get("business_name"),
        phone: row.get("phone"),
        working_hours_start: row.get("working_hours_start"),
        working_hours_end: row.get("working_hours_end"),
        working_days,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl EntityStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn list_clients(&self, owner: OwnerId) -> StoreResult<Vec<Client>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM clients WHERE owner_id = $1 ORDER BY name ASC",
            CLIENT_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(client_from_row).collect())
    }

    async fn insert_client(&self, owner: OwnerId, client: NewClient) -> StoreResult<Client> {
        info!("Creating client for owner: {}", owner);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO clients (owner_id, name, phone, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(client_from_row(&row))
    }

    async fn update_client(&self, owner: OwnerId, id: Uuid, patch: ClientPatch) -> StoreResult<()> {
        let (set_phone, phone) = assignment(patch.phone);
        let (set_notes, notes) = assignment(patch.notes);

        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = COALESCE($3, name),
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                notes = CASE WHEN $6 THEN $7 ELSE notes END,
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner.as_uuid())
        .bind(&patch.name)
        .bind(set_phone)
        .bind(phone)
        .bind(set_notes)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected())
    }

    async fn delete_client(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected())
    }

    async fn list_services(&self, owner: OwnerId) -> StoreResult<Vec<Service>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM services WHERE owner_id = $1 ORDER BY name ASC",
            SERVICE_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(service_from_row).collect())
    }

    async fn insert_service(&self, owner: OwnerId, service: NewService) -> StoreResult<Service> {
        info!("Creating service '{}' for owner: {}", service.name, owner);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO services (owner_id, name, price, duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(&service.name)
        .bind(service.price)
        .bind(service.duration_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(service_from_row(&row))
    }

    async fn update_service(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: ServicePatch,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET name = COALESCE($3, name),
                price = COALESCE($4, price),
                duration_minutes = COALESCE($5, duration_minutes),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner.as_uuid())
        .bind(&patch.name)
        .bind(patch.price)
        .bind(patch.duration_minutes)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected())
    }

    async fn delete_service(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected())
    }

    async fn list_appointments(
        &self,
        owner: OwnerId,
        date: Option<NaiveDate>,
    ) -> StoreResult<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE owner_id = $1 AND ($2::date IS NULL OR date = $2)
            ORDER BY date ASC, time ASC
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(appointment_from_row).collect()
    }

    async fn get_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<Appointment> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = $1 AND owner_id = $2",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => appointment_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn insert_appointment(
        &self,
        owner: OwnerId,
        appointment: NewAppointment,
    ) -> StoreResult<Appointment> {
        info!(
            "Scheduling '{}' for '{}' on {} {}",
            appointment.service_name, appointment.client_name, appointment.date, appointment.time
        );

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO appointments
                (owner_id, client_id, service_id, client_name, service_name,
                 date, time, price, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(appointment.client_id)
        .bind(appointment.service_id)
        .bind(&appointment.client_name)
        .bind(&appointment.service_name)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.price)
        .bind(AppointmentStatus::Scheduled.as_str())
        .bind(&appointment.notes)
        .fetch_one(&self.pool)
        .await?;

        appointment_from_row(&row)
    }

    async fn update_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> StoreResult<()> {
        let (set_notes, notes) = assignment(patch.notes);

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET client_id = COALESCE($3, client_id),
                service_id = COALESCE($4, service_id),
                client_name = COALESCE($5, client_name),
                service_name = COALESCE($6, service_name),
                date = COALESCE($7, date),
                time = COALESCE($8, time),
                price = COALESCE($9, price),
                notes = CASE WHEN $10 THEN $11 ELSE notes END,
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner.as_uuid())
        .bind(patch.client_id)
        .bind(patch.service_id)
        .bind(&patch.client_name)
        .bind(&patch.service_name)
        .bind(patch.date)
        .bind(patch.time)
        .bind(patch.price)
        .bind(set_notes)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected())
    }

    async fn transition_appointment(
        &self,
        owner: OwnerId,
        id: Uuid,
        to: AppointmentStatus,
    ) -> StoreResult<AppointmentStatus> {
        info!("Moving appointment {} to {}", id, to);

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = $3, updated_at = now()
            WHERE id = $1 AND owner_id = $2 AND status = $4
            "#,
        )
        .bind(id)
        .bind(owner.as_uuid())
        .bind(to.as_str())
        .bind(AppointmentStatus::Scheduled.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(AppointmentStatus::Scheduled);
        }

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM appointments WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match status {
            Some(status) => status.parse().map_err(StoreError::Corrupt),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_appointment(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected())
    }

    async fn list_transactions(&self, owner: OwnerId) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE owner_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn insert_transaction(
        &self,
        owner: OwnerId,
        transaction: NewTransaction,
    ) -> StoreResult<Transaction> {
        info!(
            "Posting {} of {} on {}: {}",
            transaction.kind, transaction.amount, transaction.date, transaction.description
        );

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO transactions (owner_id, appointment_id, description, amount, type, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(transaction.appointment_id)
        .bind(&transaction.description)
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(transaction.date)
        .fetch_one(&self.pool)
        .await?;

        transaction_from_row(&row)
    }

    async fn delete_transaction(&self, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected())
    }

    async fn get_profile(&self, owner: OwnerId) -> StoreResult<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE owner_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn upsert_profile(&self, owner: OwnerId, patch: ProfilePatch) -> StoreResult<Profile> {
        info!("Saving profile for owner: {}", owner);

        let (set_business_name, business_name) = assignment(patch.business_name);
        let (set_phone, phone) = assignment(patch.phone);
        let days: Option<Vec<String>> = patch
            .working_days
            .map(|days| days.iter().map(|d| d.to_string()).collect());

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO profiles
                (owner_id, business_name, phone, working_hours_start, working_hours_end, working_days)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (owner_id) DO UPDATE
            SET business_name = CASE WHEN $7 THEN EXCLUDED.business_name ELSE profiles.business_name END,
                phone = CASE WHEN $8 THEN EXCLUDED.phone ELSE profiles.phone END,
                working_hours_start = COALESCE(EXCLUDED.working_hours_start, profiles.working_hours_start),
                working_hours_end = COALESCE(EXCLUDED.working_hours_end, profiles.working_hours_end),
                working_days = COALESCE(EXCLUDED.working_days, profiles.working_days),
                updated_at = now()
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(business_name)
        .bind(phone)
        .bind(patch.working_hours_start)
        .bind(patch.working_hours_end)
        .bind(days)
        .bind(set_business_name)
        .bind(set_phone)
        .fetch_one(&self.pool)
        .await?;

        profile_from_row(&row)
    }
}
