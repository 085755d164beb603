//! Collaborators shared by every agenda operation

use std::hash::Hash;
use std::sync::Arc;
use tracing::warn;

use crate::collections::{Collection, CollectionCache, VersionStore};
use crate::error::{AgendaError, AgendaResult};
use crate::models::OwnerId;
use crate::notify::{Notice, Notifier};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AgendaContext {
    pub store: Arc<dyn EntityStore>,
    pub notifier: Arc<dyn Notifier>,
    pub versions: Arc<dyn VersionStore>,
}

impl AgendaContext {
    pub fn new(
        store: Arc<dyn EntityStore>,
        notifier: Arc<dyn Notifier>,
        versions: Arc<dyn VersionStore>,
    ) -> Self {
        Self {
            store,
            notifier,
            versions,
        }
    }

    /// Mark collections stale after a successful write
    pub async fn invalidate(&self, owner: OwnerId, collections: &[Collection]) {
        for collection in collections {
            if let Err(e) = self.versions.bump(*collection, owner).await {
                warn!("Failed to bump {} version for {}: {}", collection, owner, e);
            }
        }
    }

    /// Emit the single notice for an operation outcome and pass it on
    pub fn report<T>(
        &self,
        result: AgendaResult<T>,
        success: Notice,
        failure_title: &str,
    ) -> AgendaResult<T> {
        match &result {
            Ok(_) => self.notifier.notify(success),
            Err(e) => self
                .notifier
                .notify(Notice::error(failure_title, e.to_string())),
        }
        result
    }

    /// Serve rows from `cache` unless the collection version moved on
    pub async fn cached<K, T, F, Fut>(
        &self,
        cache: &CollectionCache<K, T>,
        owner: OwnerId,
        key: K,
        fetch: F,
    ) -> AgendaResult<Arc<Vec<T>>>
    where
        K: Eq + Hash + Clone,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = AgendaResult<Vec<T>>>,
    {
        let version = match self.versions.current(cache.collection(), owner).await {
            Ok(version) => version,
            Err(e) => {
                warn!(
                    "Version lookup for {} failed, bypassing cache: {}",
                    cache.collection(),
                    e
                );
                return Ok(Arc::new(fetch().await?));
            }
        };

        if let Some(rows) = cache.fresh(owner, &key, version) {
            return Ok(rows);
        }

        let rows = fetch().await?;
        Ok(cache.store(owner, key, version, rows))
    }
}

/// Every operation needs an authenticated owner
pub fn require_owner(owner: Option<OwnerId>) -> AgendaResult<OwnerId> {
    owner.ok_or(AgendaError::Unauthenticated)
}
