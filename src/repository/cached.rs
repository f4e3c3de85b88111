//! Cache-aside decorators over the store traits
//!
//! Reads go to Redis first and fall back to the wrapped store; writes go to the
//! store and then invalidate the affected keys. A Redis read failure degrades
//! to a store read. Day-range ledger queries are never cached: slot generation
//! must see every committed booking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::{CalendarStore, CatalogStore, ClientStore, LedgerStore};
use crate::{
    error::AppResult,
    models::{Appointment, ClientProfile, OperatingWindow, Revision, Service},
    services::redis::RedisCache,
};

const ACTIVE_SERVICES_KEY: &str = "services:active";
const ALL_WINDOWS_KEY: &str = "working_hours:all";

fn service_key(id: Uuid) -> String {
    format!("service:{}", id)
}

fn window_day_key(day_of_week: i16) -> String {
    format!("working_hours:day:{}", day_of_week)
}

fn appointment_key(id: Uuid) -> String {
    format!("appointment:{}", id)
}

fn client_appointments_key(client_id: Uuid, scheduled_only: bool) -> String {
    if scheduled_only {
        format!("scheduled_appointments:client:{}", client_id)
    } else {
        format!("appointments:client:{}", client_id)
    }
}

async fn read_through<T, F, Fut>(cache: &RedisCache, key: &str, load: F) -> AppResult<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = AppResult<T>> + Send,
{
    match cache.get_json::<T>(key).await {
        Ok(Some(hit)) => return Ok(hit),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {}, using store: {}", key, e),
    }

    let value = load().await?;
    if let Err(e) = cache.set_json(key, &value).await {
        tracing::warn!("Cache fill failed for {}: {}", key, e);
    }
    Ok(value)
}

pub struct CachedCatalog {
    inner: Arc<dyn CatalogStore>,
    cache: RedisCache,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogStore>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl CatalogStore for CachedCatalog {
    async fn list_active(&self) -> AppResult<Vec<Service>> {
        read_through(&self.cache, ACTIVE_SERVICES_KEY, || self.inner.list_active()).await
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Service>> {
        let mut found: Vec<Option<Service>> = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            let hit = match self.cache.get_json::<Service>(&service_key(*id)).await {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!("Cache read failed for service {}: {}", id, e);
                    None
                }
            };
            if hit.is_none() {
                missing.push(*id);
            }
            found.push(hit);
        }

        if !missing.is_empty() {
            let loaded = self.inner.get_by_ids(&missing).await?;
            for service in &loaded {
                if let Err(e) = self.cache.set_json(&service_key(service.id), service).await {
                    tracing::warn!("Cache fill failed for service {}: {}", service.id, e);
                }
            }
            for (slot, id) in found.iter_mut().zip(ids) {
                if slot.is_none() {
                    *slot = loaded.iter().find(|s| s.id == *id).cloned();
                }
            }
        }

        Ok(found.into_iter().flatten().collect())
    }

    async fn save(&self, service: &Service) -> AppResult<()> {
        self.inner.save(service).await?;
        self.cache
            .invalidate(&[ACTIVE_SERVICES_KEY.to_string(), service_key(service.id)])
            .await
    }
}

pub struct CachedCalendar {
    inner: Arc<dyn CalendarStore>,
    cache: RedisCache,
}

impl CachedCalendar {
    pub fn new(inner: Arc<dyn CalendarStore>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl CalendarStore for CachedCalendar {
    async fn active_windows_for_day(&self, day_of_week: i16) -> AppResult<Vec<OperatingWindow>> {
        read_through(&self.cache, &window_day_key(day_of_week), || {
            self.inner.active_windows_for_day(day_of_week)
        })
        .await
    }

    async fn list_windows(&self) -> AppResult<Vec<OperatingWindow>> {
        read_through(&self.cache, ALL_WINDOWS_KEY, || self.inner.list_windows()).await
    }

    async fn replace_window(&self, window: &OperatingWindow) -> AppResult<()> {
        self.inner.replace_window(window).await?;
        // The window may have moved between weekdays
        let mut keys: Vec<String> = (0..=6).map(window_day_key).collect();
        keys.push(ALL_WINDOWS_KEY.to_string());
        self.cache.invalidate(&keys).await
    }
}

pub struct CachedLedger {
    inner: Arc<dyn LedgerStore>,
    cache: RedisCache,
}

impl CachedLedger {
    pub fn new(inner: Arc<dyn LedgerStore>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }

    async fn invalidate_for(&self, appointment: &Appointment) -> AppResult<()> {
        self.cache
            .invalidate(&[
                appointment_key(appointment.id),
                client_appointments_key(appointment.client_id, true),
                client_appointments_key(appointment.client_id, false),
            ])
            .await
    }
}

#[async_trait]
impl LedgerStore for CachedLedger {
    async fn appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        self.inner.appointments_between(from, to).await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        read_through(&self.cache, &appointment_key(id), || self.inner.get(id)).await
    }

    async fn for_client(&self, client_id: Uuid, scheduled_only: bool) -> AppResult<Vec<Appointment>> {
        read_through(
            &self.cache,
            &client_appointments_key(client_id, scheduled_only),
            || self.inner.for_client(client_id, scheduled_only),
        )
        .await
    }

    async fn save(&self, appointment: &Appointment) -> AppResult<()> {
        self.inner.save(appointment).await?;
        self.invalidate_for(appointment).await
    }

    async fn update(&self, appointment: &Appointment, expected: Revision) -> AppResult<()> {
        let result = self.inner.update(appointment, expected).await;
        // A rejected write usually means the cached copy is stale as well
        let invalidated = self.invalidate_for(appointment).await;
        result?;
        invalidated
    }
}

pub struct CachedClients {
    inner: Arc<dyn ClientStore>,
    cache: RedisCache,
}

impl CachedClients {
    pub fn new(inner: Arc<dyn ClientStore>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ClientStore for CachedClients {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<ClientProfile>> {
        read_through(&self.cache, &format!("client:{}", id), || {
            self.inner.get_profile(id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_keys_distinguish_scheduled_view() {
        let id = Uuid::nil();
        assert_ne!(
            client_appointments_key(id, true),
            client_appointments_key(id, false)
        );
        assert_eq!(window_day_key(3), "working_hours:day:3");
    }
}
