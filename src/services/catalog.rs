//! Service catalog: active services and per-booking totals

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{service::CreateService, Service},
    repository::Repository,
};

/// Services resolved for one booking, in request order
#[derive(Debug, Clone)]
pub struct BookableSelection {
    pub services: Vec<Service>,
    pub total_minutes: i64,
    pub total_price: Decimal,
}

impl BookableSelection {
    pub fn service_ids(&self) -> Vec<Uuid> {
        self.services.iter().map(|s| s.id).collect()
    }
}

/// Remove repeated ids, keeping first-occurrence order
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Active services in stable display order
    pub async fn list_active(&self) -> AppResult<Vec<Service>> {
        self.repository.catalog.list_active().await
    }

    /// Services by id, active or not, in request order; `NotFound` if any id is unknown
    pub async fn by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Service>> {
        let ids = dedup_ids(ids);
        let found = self.repository.catalog.get_by_ids(&ids).await?;

        ids.iter()
            .map(|id| {
                found
                    .iter()
                    .find(|s| s.id == *id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
            })
            .collect()
    }

    /// Resolve services that can be newly booked
    ///
    /// Fails with `Validation` for an empty request and with `InvalidService`
    /// for an unknown id, an inactive service, or a non-positive duration.
    pub async fn resolve_bookable(&self, ids: &[Uuid]) -> AppResult<BookableSelection> {
        if ids.is_empty() {
            return Err(AppError::Validation("at least one service is required".to_string()));
        }

        let services = self.by_ids(ids).await.map_err(|e| match e {
            AppError::NotFound(msg) => AppError::InvalidService(msg),
            other => other,
        })?;

        for service in &services {
            if !service.is_active {
                return Err(AppError::InvalidService(format!(
                    "Service {} is no longer offered",
                    service.id
                )));
            }
            if service.duration_minutes <= 0 {
                return Err(AppError::InvalidService(format!(
                    "Service {} has non-positive duration",
                    service.id
                )));
            }
        }

        let total_minutes = services.iter().map(|s| i64::from(s.duration_minutes)).sum();
        let total_price = services.iter().map(|s| s.price).sum();

        Ok(BookableSelection {
            services,
            total_minutes,
            total_price,
        })
    }

    /// Summed duration in minutes
    pub async fn total_duration(&self, ids: &[Uuid]) -> AppResult<i64> {
        Ok(self.resolve_bookable(ids).await?.total_minutes)
    }

    /// Summed price
    pub async fn total_price(&self, ids: &[Uuid]) -> AppResult<Decimal> {
        Ok(self.resolve_bookable(ids).await?.total_price)
    }

    /// Add a service to the catalog; it is bookable immediately
    pub async fn create(&self, data: &CreateService) -> AppResult<Service> {
        data.validate()?;
        if data.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be blank".to_string()));
        }
        if data.price < Decimal::ZERO {
            return Err(AppError::Validation("price must not be negative".to_string()));
        }

        let mut service = Service::new(data.name.trim(), data.duration_minutes, data.price);
        if let Some(description) = data.description.as_deref().filter(|d| !d.trim().is_empty()) {
            service = service.with_description(description.trim());
        }
        self.repository.catalog.save(&service).await?;

        tracing::info!(
            "Service {} ({}) added: {} min, {}",
            service.id,
            service.name,
            service.duration_minutes,
            service.price
        );
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;

    fn setup() -> (CatalogService, Service, Service, Service) {
        let store = MemoryStore::new();
        let haircut = Service::new("Haircut", 60, Decimal::new(1500, 0));
        let beard = Service::new("Beard trim", 30, Decimal::new(70050, 2));
        let retired = Service::new("Hot towel", 15, Decimal::new(300, 0)).inactive();
        for s in [&haircut, &beard, &retired] {
            store.insert_service(s.clone()).unwrap();
        }
        (
            CatalogService::new(Repository::in_memory(store)),
            haircut,
            beard,
            retired,
        )
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let (catalog, _, _, retired) = setup();
        let active = catalog.list_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|s| s.id != retired.id));
        // sorted by name
        assert_eq!(active[0].name, "Beard trim");
    }

    #[tokio::test]
    async fn test_totals() {
        let (catalog, haircut, beard, _) = setup();
        let ids = [haircut.id, beard.id];
        assert_eq!(catalog.total_duration(&ids).await.unwrap(), 90);
        assert_eq!(catalog.total_price(&ids).await.unwrap(), Decimal::new(220050, 2));
    }

    #[tokio::test]
    async fn test_duplicate_ids_counted_once() {
        let (catalog, haircut, _, _) = setup();
        let total = catalog
            .total_duration(&[haircut.id, haircut.id])
            .await
            .unwrap();
        assert_eq!(total, 60);
    }

    #[tokio::test]
    async fn test_by_ids_unknown_is_not_found() {
        let (catalog, haircut, _, _) = setup();
        let err = catalog.by_ids(&[haircut.id, Uuid::new_v4()]).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_by_ids_returns_inactive_for_history() {
        let (catalog, _, _, retired) = setup();
        let services = catalog.by_ids(&[retired.id]).await.unwrap();
        assert_eq!(services[0].id, retired.id);
    }

    #[tokio::test]
    async fn test_inactive_or_unknown_not_bookable() {
        let (catalog, haircut, _, retired) = setup();

        let err = catalog.resolve_bookable(&[haircut.id, retired.id]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidService(_)));

        let err = catalog.resolve_bookable(&[Uuid::new_v4()]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidService(_)));

        let err = catalog.resolve_bookable(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_duration_rejected() {
        let store = MemoryStore::new();
        let broken = Service::new("Consultation", 0, Decimal::ZERO);
        store.insert_service(broken.clone()).unwrap();
        let catalog = CatalogService::new(Repository::in_memory(store));

        let err = catalog.total_duration(&[broken.id]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidService(_)));
    }

    #[tokio::test]
    async fn test_created_service_is_bookable() {
        let (catalog, haircut, _, _) = setup();
        let created = catalog
            .create(&CreateService {
                name: " Kids cut ".to_string(),
                description: Some("Under 12".to_string()),
                duration_minutes: 45,
                price: Decimal::new(1000, 0),
            })
            .await
            .unwrap();
        assert_eq!(created.name, "Kids cut");
        assert_eq!(created.description.as_deref(), Some("Under 12"));
        assert!(created.is_active);

        let active = catalog.list_active().await.unwrap();
        assert!(active.iter().any(|s| s.id == created.id));
        assert_eq!(catalog.total_duration(&[haircut.id, created.id]).await.unwrap(), 105);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (catalog, _, _, _) = setup();
        let request = |name: &str, minutes: i32, price: Decimal| CreateService {
            name: name.to_string(),
            description: None,
            duration_minutes: minutes,
            price,
        };

        for bad in [
            request("Fade", 0, Decimal::new(900, 0)),
            request("   ", 30, Decimal::new(900, 0)),
            request("Fade", 30, Decimal::new(-1, 0)),
        ] {
            let err = catalog.create(&bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(catalog.list_active().await.unwrap().len(), 2);
    }
}
