//! Generic CRUD service.
//!
//! The product and user aggregates share an identical operation set and
//! identical error-mapping rules, so the four-operation skeleton exists once
//! and is parameterized over the aggregate. Per-aggregate behavior (the
//! translations, the insert-only password hashing hook) plugs in through the
//! [`Aggregate`] trait.

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::repository::{EntityStore, Page, PageRequest, Record, StoreError};

/// Hooks one aggregate (entity + DTO pair + association target) into the
/// generic CRUD flow. The four functions are the translation layer: pure
/// field copies, except that `apply` resolves association ids into refs
/// through the store's `get_ref` (no I/O, unchecked until commit).
pub trait Aggregate: Send + Sync + 'static {
    /// Label used in logs.
    const NAME: &'static str;

    type Entity: Record;
    type Assoc: Record;
    type Dto: Send + Sync;
    type InsertDto: Send + Sync;

    /// Fresh, unidentified entity for the insert path.
    fn blank() -> Self::Entity;

    /// Scalar-only DTO for list/page views; association payload left empty.
    fn summary(entity: &Self::Entity) -> Self::Dto;

    /// Scalar + association DTO for single-entity detail views.
    fn detail(entity: &Self::Entity) -> Self::Dto;

    /// Overwrite every mutable scalar field from the DTO, then replace the
    /// association collection wholesale with a fresh set built from the
    /// incoming member ids. Invalid ids are not detected here; they surface
    /// as integrity failures when the save commits.
    fn apply(dto: &Self::Dto, entity: &mut Self::Entity, refs: &dyn EntityStore<Self::Assoc>);

    /// Insert-path variant of `apply`; owns insert-only work such as
    /// credential hashing, which never runs on update.
    fn apply_insert(
        dto: &Self::InsertDto,
        entity: &mut Self::Entity,
        refs: &dyn EntityStore<Self::Assoc>,
    ) -> Result<(), ServiceError>;
}

/// CRUD service over one aggregate; stateless across calls.
pub struct CrudService<A: Aggregate> {
    store: Arc<dyn EntityStore<A::Entity>>,
    refs: Arc<dyn EntityStore<A::Assoc>>,
}

impl<A: Aggregate> CrudService<A> {
    pub fn new(store: Arc<dyn EntityStore<A::Entity>>, refs: Arc<dyn EntityStore<A::Assoc>>) -> Self {
        Self { store, refs }
    }

    /// Read-only. Store ordering and page metadata pass through unchanged.
    pub async fn find_all_paged(&self, req: &PageRequest) -> Result<Page<A::Dto>, ServiceError> {
        let page = self.store.find_page(req).await.map_err(Self::infra)?;
        debug!(
            entity = A::NAME,
            page = req.page,
            returned = page.content.len(),
            total = page.total_elements,
            "page fetched"
        );
        Ok(page.map(|e| A::summary(&e)))
    }

    /// Read-only. Detail view including associations.
    pub async fn find_by_id(&self, id: i64) -> Result<A::Dto, ServiceError> {
        let entity = self
            .store
            .find_by_id(id)
            .await
            .map_err(Self::infra)?
            .ok_or(ServiceError::NotFound(id))?;
        Ok(A::detail(&entity))
    }

    pub async fn insert(&self, dto: &A::InsertDto) -> Result<A::Dto, ServiceError> {
        let mut entity = A::blank();
        A::apply_insert(dto, &mut entity, self.refs.as_ref())?;
        let saved = self.store.save(entity).await.map_err(Self::write_err)?;
        info!(entity = A::NAME, id = saved.id().unwrap_or_default(), "inserted");
        Ok(A::summary(&saved))
    }

    /// Loads the target, applies the DTO and persists, all within the span
    /// of one call. A miss at either end reports the same kind as
    /// `find_by_id` so not-found semantics stay uniform across read and write.
    pub async fn update(&self, id: i64, dto: &A::Dto) -> Result<A::Dto, ServiceError> {
        let mut entity = self
            .store
            .find_by_id(id)
            .await
            .map_err(Self::infra)?
            .ok_or(ServiceError::NotFound(id))?;
        A::apply(dto, &mut entity, self.refs.as_ref());
        let saved = self.store.save(entity).await.map_err(|e| match e {
            // the row vanished between load and save; same outcome as a miss
            StoreError::NoSuchRow(_) => ServiceError::NotFound(id),
            other => Self::write_err(other),
        })?;
        info!(entity = A::NAME, id, "updated");
        Ok(A::summary(&saved))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        match self.store.delete_by_id(id).await {
            Ok(()) => {
                info!(entity = A::NAME, id, "deleted");
                Ok(())
            }
            Err(StoreError::NoSuchRow(_)) => Err(ServiceError::NotFound(id)),
            Err(StoreError::Integrity(_)) => {
                Err(ServiceError::Conflict("referenced by other records".to_string()))
            }
            Err(e) => Err(Self::infra(e)),
        }
    }

    fn infra(e: StoreError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    /// Save-time mapping: constraint breakage is a conflict the caller can
    /// act on; everything else is infrastructure.
    fn write_err(e: StoreError) -> ServiceError {
        match e {
            StoreError::Integrity(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}
