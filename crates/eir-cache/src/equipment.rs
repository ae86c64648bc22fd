//! Equipment-status cache entries, keyed by IMEI.
//!
//! Kept decoupled from `eir-core`'s `EquipmentStatus` enum: the status is
//! carried as the wire string (`WHITELISTED`/`BLACKLISTED`/`GREYLISTED`) so
//! this crate has no dependency on the decision-engine crate.

use crate::client::Cache;
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const KEY_PREFIX: &str = "eir:equipment:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedEquipmentStatus {
    pub status: String,
    pub reason: Option<String>,
}

fn cache_key(imei: &str) -> String {
    format!("{}{}", KEY_PREFIX, imei)
}

/// Thin, IMEI-scoped wrapper over a [`Cache`] for the decision engine's
/// read-through / write-through lookups.
pub struct EquipmentStatusCache<'a> {
    cache: &'a dyn CacheGet,
    ttl: Duration,
}

/// Object-safe subset of [`Cache`] specialised to `CachedEquipmentStatus`,
/// since `Cache::get`/`Cache::set` are generic and can't be boxed directly.
#[async_trait::async_trait]
pub trait CacheGet: Send + Sync {
    async fn get_status(&self, key: &str) -> Result<Option<CachedEquipmentStatus>, CacheError>;
    async fn set_status(
        &self,
        key: &str,
        value: &CachedEquipmentStatus,
        ttl: Duration,
    ) -> Result<(), CacheError>;
    async fn delete_status(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait::async_trait]
impl<C: Cache> CacheGet for C {
    async fn get_status(&self, key: &str) -> Result<Option<CachedEquipmentStatus>, CacheError> {
        Cache::get(self, key).await
    }

    async fn set_status(
        &self,
        key: &str,
        value: &CachedEquipmentStatus,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        Cache::set(self, key, value, Some(ttl)).await
    }

    async fn delete_status(&self, key: &str) -> Result<(), CacheError> {
        Cache::delete(self, key).await
    }
}

impl<'a> EquipmentStatusCache<'a> {
    pub fn new(cache: &'a dyn CacheGet, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub async fn probe(&self, imei: &str) -> Result<Option<CachedEquipmentStatus>, CacheError> {
        self.cache.get_status(&cache_key(imei)).await
    }

    pub async fn populate(
        &self,
        imei: &str,
        status: &CachedEquipmentStatus,
    ) -> Result<(), CacheError> {
        self.cache.set_status(&cache_key(imei), status, self.ttl).await
    }

    pub async fn invalidate(&self, imei: &str) -> Result<(), CacheError> {
        self.cache.delete_status(&cache_key(imei)).await
    }
}
