//! Appointment lifecycle
//!
//! Appointments start `scheduled` and end either `completed` or `canceled`.
//! Completing one posts a credit to the cash ledger.
//!
//! Completion is two sequential store writes: the status change, then the
//! ledger insert. They are not atomic. When the insert fails the appointment
//! stays `completed` with no ledger entry and the failure is reported; no
//! compensating write is attempted.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::collections::{Collection, CollectionCache};
use crate::context::{AgendaContext, require_owner};
use crate::error::{AgendaError, AgendaResult};
use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, NewTransaction, OwnerId, Transaction,
};
use crate::notify::Notice;
use crate::resolver::AppointmentDraft;

fn created_notice() -> Notice {
    Notice::success(
        "Appointment created!",
        "The service was scheduled successfully.",
    )
}

fn completed_notice() -> Notice {
    Notice::success(
        "Service completed!",
        "The amount was added to the cash ledger.",
    )
}

#[derive(Clone)]
pub struct AppointmentController {
    ctx: AgendaContext,
    cache: Arc<CollectionCache<Option<NaiveDate>, Appointment>>,
}

impl AppointmentController {
    pub fn new(ctx: AgendaContext) -> Self {
        Self {
            ctx,
            cache: Arc::new(CollectionCache::new(Collection::Appointments)),
        }
    }

    /// Appointments ordered by date and time, optionally for one day
    pub async fn list(
        &self,
        owner: Option<OwnerId>,
        date: Option<NaiveDate>,
    ) -> AgendaResult<Arc<Vec<Appointment>>> {
        let owner = require_owner(owner)?;
        let store = Arc::clone(&self.ctx.store);
        self.ctx
            .cached(&self.cache, owner, date, || async move {
                store
                    .list_appointments(owner, date)
                    .await
                    .map_err(AgendaError::from)
            })
            .await
    }

    pub async fn get(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<Appointment> {
        let owner = require_owner(owner)?;
        Ok(self.ctx.store.get_appointment(owner, id).await?)
    }

    /// Book a new appointment in the `scheduled` state
    pub async fn create(
        &self,
        owner: Option<OwnerId>,
        draft: AppointmentDraft,
    ) -> AgendaResult<Appointment> {
        let result = self.insert(owner, draft).await;
        self.ctx.report(result, created_notice(), "Could not schedule")
    }

    /// Book from a draft whose picked client/service ids are resolved
    /// against the owner's current catalog first
    pub async fn create_resolved(
        &self,
        owner: Option<OwnerId>,
        draft: AppointmentDraft,
        catalog: &Catalog,
    ) -> AgendaResult<Appointment> {
        let result = match Self::resolve(owner, draft, catalog).await {
            Ok(draft) => self.insert(owner, draft).await,
            Err(e) => Err(e),
        };
        self.ctx.report(result, created_notice(), "Could not schedule")
    }

    async fn resolve(
        owner: Option<OwnerId>,
        draft: AppointmentDraft,
        catalog: &Catalog,
    ) -> AgendaResult<AppointmentDraft> {
        if draft.client_id.is_none() && draft.service_id.is_none() {
            return Ok(draft);
        }
        let clients = catalog.list_clients(owner).await?;
        let services = catalog.list_services(owner).await?;
        Ok(draft.resolve(&clients, &services))
    }

    async fn insert(
        &self,
        owner: Option<OwnerId>,
        draft: AppointmentDraft,
    ) -> AgendaResult<Appointment> {
        let owner = require_owner(owner)?;
        let appointment = draft.validate()?;
        let created = self.ctx.store.insert_appointment(owner, appointment).await?;
        self.ctx
            .invalidate(owner, &[Collection::Appointments])
            .await;
        Ok(created)
    }

    /// Apply a partial update; status is not patchable here
    pub async fn update(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> AgendaResult<()> {
        let result = self.patch(owner, id, patch).await;

        self.ctx.report(
            result,
            Notice::success("Appointment updated!", "Your changes were saved."),
            "Could not update",
        )
    }

    async fn patch(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> AgendaResult<()> {
        let owner = require_owner(owner)?;
        if patch.is_empty() {
            return Err(AgendaError::Validation("Nothing to update".to_string()));
        }
        let patch = patch.validate()?;
        self.ctx.store.update_appointment(owner, id, patch).await?;
        self.ctx
            .invalidate(owner, &[Collection::Appointments])
            .await;
        Ok(())
    }

    /// Mark a scheduled appointment completed and post its credit
    pub async fn complete(
        &self,
        owner: Option<OwnerId>,
        appointment: &Appointment,
    ) -> AgendaResult<Transaction> {
        let result = self.post_completion(owner, appointment).await;
        self.ctx.report(result, completed_notice(), "Could not complete")
    }

    /// Complete the appointment currently stored under `id`
    pub async fn complete_by_id(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
    ) -> AgendaResult<Transaction> {
        let current = match require_owner(owner) {
            Ok(owner) => self
                .ctx
                .store
                .get_appointment(owner, id)
                .await
                .map_err(AgendaError::from),
            Err(e) => Err(e),
        };

        match current {
            Ok(appointment) => self.complete(owner, &appointment).await,
            Err(e) => self
                .ctx
                .report(Err(e), completed_notice(), "Could not complete"),
        }
    }

    async fn post_completion(
        &self,
        owner: Option<OwnerId>,
        appointment: &Appointment,
    ) -> AgendaResult<Transaction> {
        let owner = require_owner(owner)?;
        appointment.status.transition(AppointmentStatus::Completed)?;

        // The stored status decides; the snapshot may be stale
        self.ctx
            .store
            .transition_appointment(owner, appointment.id, AppointmentStatus::Completed)
            .await?
            .transition(AppointmentStatus::Completed)?;
        info!("Appointment {} completed", appointment.id);

        let posted = self
            .ctx
            .store
            .insert_transaction(owner, NewTransaction::for_completed(appointment))
            .await;

        match posted {
            Ok(transaction) => {
                self.ctx
                    .invalidate(owner, &[Collection::Appointments, Collection::Transactions])
                    .await;
                Ok(transaction)
            }
            Err(e) => {
                warn!(
                    "Appointment {} is completed but its ledger entry was not posted: {}",
                    appointment.id, e
                );
                // The status change did land, so cached lists are stale.
                self.ctx
                    .invalidate(owner, &[Collection::Appointments])
                    .await;
                Err(e.into())
            }
        }
    }

    /// Cancel a scheduled appointment; the ledger is not touched
    pub async fn cancel(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let result = self.set_canceled(owner, id).await;

        self.ctx.report(
            result,
            Notice::success("Appointment canceled", "The appointment was canceled."),
            "Could not cancel",
        )
    }

    async fn set_canceled(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let owner = require_owner(owner)?;
        self.ctx
            .store
            .transition_appointment(owner, id, AppointmentStatus::Canceled)
            .await?
            .transition(AppointmentStatus::Canceled)?;
        self.ctx
            .invalidate(owner, &[Collection::Appointments])
            .await;
        Ok(())
    }

    /// Remove an appointment. Ledger entries posted for it are kept and
    /// keep pointing at the removed id.
    pub async fn delete(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let result = self.remove(owner, id).await;

        self.ctx.report(
            result,
            Notice::success("Appointment removed!", "The appointment was deleted."),
            "Could not remove",
        )
    }

    async fn remove(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let owner = require_owner(owner)?;
        self.ctx.store.delete_appointment(owner, id).await?;
        self.ctx
            .invalidate(owner, &[Collection::Appointments])
            .await;
        Ok(())
    }
}
