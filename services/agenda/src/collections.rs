//! Collection versions and the per-owner read cache
//!
//! Each `(collection, owner)` pair carries a version number. Mutations bump
//! it; cached reads remember the version they were fetched at and refetch
//! from the store once the current version has moved on.

use async_trait::async_trait;
use common::cache::RedisPool;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::models::OwnerId;

/// Collections served through the read cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Services,
    Appointments,
    Transactions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Services => "services",
            Collection::Appointments => "appointments",
            Collection::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of truth for collection versions
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn current(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64>;

    /// Increment the version and return the new value
    async fn bump(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64>;
}

/// Versions kept in process memory
#[derive(Default)]
pub struct MemoryVersions {
    versions: Mutex<HashMap<(Collection, OwnerId), u64>>,
}

impl MemoryVersions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for MemoryVersions {
    async fn current(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64> {
        let versions = self
            .versions
            .lock()
            .map_err(|_| anyhow::anyhow!("version map poisoned"))?;
        Ok(versions.get(&(collection, owner)).copied().unwrap_or(0))
    }

    async fn bump(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64> {
        let mut versions = self
            .versions
            .lock()
            .map_err(|_| anyhow::anyhow!("version map poisoned"))?;
        let version = versions.entry((collection, owner)).or_insert(0);
        *version += 1;
        Ok(*version)
    }
}

/// Versions shared between processes through Redis counters
#[derive(Clone)]
pub struct RedisVersions {
    pool: RedisPool,
}

impl RedisVersions {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(collection: Collection, owner: OwnerId) -> String {
        format!("version:{}:{}", collection, owner)
    }
}

#[async_trait]
impl VersionStore for RedisVersions {
    async fn current(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64> {
        self.pool.counter(&Self::key(collection, owner)).await
    }

    async fn bump(&self, collection: Collection, owner: OwnerId) -> anyhow::Result<u64> {
        self.pool.incr(&Self::key(collection, owner)).await
    }
}

/// Rows fetched at a given collection version
struct Entry<T> {
    version: u64,
    rows: Arc<Vec<T>>,
}

/// Read cache keyed by owner plus an optional filter
pub struct CollectionCache<K, T> {
    collection: Collection,
    entries: Mutex<HashMap<(OwnerId, K), Entry<T>>>,
}

impl<K: Eq + Hash + Clone, T> CollectionCache<K, T> {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Rows cached for `key`, if they were fetched at `version`
    pub fn fresh(&self, owner: OwnerId, key: &K, version: u64) -> Option<Arc<Vec<T>>> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(&(owner, key.clone()))
            .filter(|entry| entry.version == version)
            .map(|entry| Arc::clone(&entry.rows))
    }

    pub fn store(&self, owner: OwnerId, key: K, version: u64, rows: Vec<T>) -> Arc<Vec<T>> {
        let rows = Arc::new(rows);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                (owner, key),
                Entry {
                    version,
                    rows: Arc::clone(&rows),
                },
            );
        }
        rows
    }
}
