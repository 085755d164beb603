//! Clients, services, manual ledger entries and the business profile
//!
//! Same contract as the appointment lifecycle: an owner is required, input is
//! validated before any store call, a successful write bumps the collection
//! version, and each mutation reports exactly one notice.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::collections::{Collection, CollectionCache};
use crate::context::{AgendaContext, require_owner};
use crate::error::{AgendaError, AgendaResult};
use crate::models::{
    Client, ClientPatch, NewClient, NewService, OwnerId, ProfilePatch, ProfileSettings, Service,
    ServicePatch, Transaction, TransactionInput,
};
use crate::notify::Notice;

#[derive(Clone)]
pub struct Catalog {
    ctx: AgendaContext,
    clients: Arc<CollectionCache<(), Client>>,
    services: Arc<CollectionCache<(), Service>>,
    transactions: Arc<CollectionCache<(), Transaction>>,
}

impl Catalog {
    pub fn new(ctx: AgendaContext) -> Self {
        Self {
            ctx,
            clients: Arc::new(CollectionCache::new(Collection::Clients)),
            services: Arc::new(CollectionCache::new(Collection::Services)),
            transactions: Arc::new(CollectionCache::new(Collection::Transactions)),
        }
    }

    async fn write<T>(
        &self,
        owner: Option<OwnerId>,
        collection: Collection,
        result: AgendaResult<T>,
    ) -> AgendaResult<T> {
        if let (Ok(_), Some(owner)) = (&result, owner) {
            self.ctx.invalidate(owner, &[collection]).await;
        }
        result
    }

    // Clients

    pub async fn list_clients(&self, owner: Option<OwnerId>) -> AgendaResult<Arc<Vec<Client>>> {
        let owner = require_owner(owner)?;
        let store = Arc::clone(&self.ctx.store);
        self.ctx
            .cached(&self.clients, owner, (), || async move {
                store.list_clients(owner).await.map_err(AgendaError::from)
            })
            .await
    }

    pub async fn create_client(
        &self,
        owner: Option<OwnerId>,
        client: NewClient,
    ) -> AgendaResult<Client> {
        let result = self.insert_client(owner, client).await;
        let result = self.write(owner, Collection::Clients, result).await;
        self.ctx.report(
            result,
            Notice::success("Client added!", "The client was registered successfully."),
            "Could not register",
        )
    }

    async fn insert_client(&self, owner: Option<OwnerId>, client: NewClient) -> AgendaResult<Client> {
        let owner = require_owner(owner)?;
        let client = client.validate()?;
        Ok(self.ctx.store.insert_client(owner, client).await?)
    }

    pub async fn update_client(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: ClientPatch,
    ) -> AgendaResult<()> {
        let result = self.patch_client(owner, id, patch).await;
        let result = self.write(owner, Collection::Clients, result).await;
        self.ctx.report(
            result,
            Notice::success("Client updated!", "Your changes were saved."),
            "Could not update",
        )
    }

    async fn patch_client(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: ClientPatch,
    ) -> AgendaResult<()> {
        let owner = require_owner(owner)?;
        let patch = patch.validate()?;
        Ok(self.ctx.store.update_client(owner, id, patch).await?)
    }

    /// Appointments booked for this client keep their name snapshot
    pub async fn delete_client(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let result = match require_owner(owner) {
            Ok(owner) => self
                .ctx
                .store
                .delete_client(owner, id)
                .await
                .map_err(AgendaError::from),
            Err(e) => Err(e),
        };
        let result = self.write(owner, Collection::Clients, result).await;
        self.ctx.report(
            result,
            Notice::success("Client removed!", "The client was deleted."),
            "Could not remove",
        )
    }

    // Services

    pub async fn list_services(&self, owner: Option<OwnerId>) -> AgendaResult<Arc<Vec<Service>>> {
        let owner = require_owner(owner)?;
        let store = Arc::clone(&self.ctx.store);
        self.ctx
            .cached(&self.services, owner, (), || async move {
                store.list_services(owner).await.map_err(AgendaError::from)
            })
            .await
    }

    pub async fn create_service(
        &self,
        owner: Option<OwnerId>,
        service: NewService,
    ) -> AgendaResult<Service> {
        let result = self.insert_service(owner, service).await;
        let result = self.write(owner, Collection::Services, result).await;
        self.ctx.report(
            result,
            Notice::success("Service added!", "The service was added to the catalog."),
            "Could not register",
        )
    }

    async fn insert_service(
        &self,
        owner: Option<OwnerId>,
        service: NewService,
    ) -> AgendaResult<Service> {
        let owner = require_owner(owner)?;
        let service = service.validate()?;
        Ok(self.ctx.store.insert_service(owner, service).await?)
    }

    /// Existing appointments keep the name and price they were booked with
    pub async fn update_service(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: ServicePatch,
    ) -> AgendaResult<()> {
        let result = self.patch_service(owner, id, patch).await;
        let result = self.write(owner, Collection::Services, result).await;
        self.ctx.report(
            result,
            Notice::success("Service updated!", "Your changes were saved."),
            "Could not update",
        )
    }

    async fn patch_service(
        &self,
        owner: Option<OwnerId>,
        id: Uuid,
        patch: ServicePatch,
    ) -> AgendaResult<()> {
        let owner = require_owner(owner)?;
        let patch = patch.validate()?;
        Ok(self.ctx.store.update_service(owner, id, patch).await?)
    }

    pub async fn delete_service(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let result = match require_owner(owner) {
            Ok(owner) => self
                .ctx
                .store
                .delete_service(owner, id)
                .await
                .map_err(AgendaError::from),
            Err(e) => Err(e),
        };
        let result = self.write(owner, Collection::Services, result).await;
        self.ctx.report(
            result,
            Notice::success("Service removed!", "The service was deleted."),
            "Could not remove",
        )
    }

    // Transactions

    /// Ledger entries, newest first
    pub async fn list_transactions(
        &self,
        owner: Option<OwnerId>,
    ) -> AgendaResult<Arc<Vec<Transaction>>> {
        let owner = require_owner(owner)?;
        let store = Arc::clone(&self.ctx.store);
        self.ctx
            .cached(&self.transactions, owner, (), || async move {
                store.list_transactions(owner).await.map_err(AgendaError::from)
            })
            .await
    }

    /// Record a manual entry; an undated entry is booked on `today`
    pub async fn create_transaction(
        &self,
        owner: Option<OwnerId>,
        input: TransactionInput,
        today: NaiveDate,
    ) -> AgendaResult<Transaction> {
        let result = self.insert_transaction(owner, input, today).await;
        let result = self.write(owner, Collection::Transactions, result).await;
        self.ctx.report(
            result,
            Notice::success("Transaction recorded!", "The entry was added to the cash ledger."),
            "Could not record",
        )
    }

    async fn insert_transaction(
        &self,
        owner: Option<OwnerId>,
        input: TransactionInput,
        today: NaiveDate,
    ) -> AgendaResult<Transaction> {
        let owner = require_owner(owner)?;
        let transaction = input.into_new(today)?;
        Ok(self.ctx.store.insert_transaction(owner, transaction).await?)
    }

    pub async fn delete_transaction(&self, owner: Option<OwnerId>, id: Uuid) -> AgendaResult<()> {
        let result = match require_owner(owner) {
            Ok(owner) => self
                .ctx
                .store
                .delete_transaction(owner, id)
                .await
                .map_err(AgendaError::from),
            Err(e) => Err(e),
        };
        let result = self.write(owner, Collection::Transactions, result).await;
        self.ctx.report(
            result,
            Notice::success("Transaction removed!", "The entry was deleted."),
            "Could not remove",
        )
    }

    // Profile

    /// Stored settings, or the defaults when nothing was saved yet
    pub async fn profile(&self, owner: Option<OwnerId>) -> AgendaResult<ProfileSettings> {
        let owner = require_owner(owner)?;
        let profile = self.ctx.store.get_profile(owner).await?;
        Ok(ProfileSettings::from_profile(profile.as_ref()))
    }

    /// Save settings, creating the profile row on first save
    pub async fn save_profile(
        &self,
        owner: Option<OwnerId>,
        patch: ProfilePatch,
    ) -> AgendaResult<ProfileSettings> {
        // Profile reads always go to the store, so there is no version to bump
        let result = self.upsert_profile(owner, patch).await;
        self.ctx.report(
            result,
            Notice::success("Settings saved!", "Your changes were saved successfully."),
            "Could not save",
        )
    }

    async fn upsert_profile(
        &self,
        owner: Option<OwnerId>,
        patch: ProfilePatch,
    ) -> AgendaResult<ProfileSettings> {
        let owner = require_owner(owner)?;
        let current = self.ctx.store.get_profile(owner).await?;
        let patch = patch.validate(&ProfileSettings::from_profile(current.as_ref()))?;
        let saved = self.ctx.store.upsert_profile(owner, patch).await?;
        Ok(ProfileSettings::from_profile(Some(&saved)))
    }
}
