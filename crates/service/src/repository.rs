//! Persistence port: the contract the CRUD services require from a store.
//!
//! Two lookup operations are deliberately distinct: `find_by_id` loads the
//! full row (associations included, may miss), while `get_ref` hands out an
//! identity-only handle whose existence is not checked until a save commits.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Category, EntityRef, Product, Role, User};

/// The three persistence failure modes the services translate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row with id {0}")]
    NoSuchRow(i64),
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Storage-facing view of a domain entity: identity, association links and
/// sortable fields. Keeps the stores generic over the concrete aggregates.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    /// ids of the association members currently linked to this record
    fn link_ids(&self) -> Vec<i64>;
    /// value compared when a page request sorts by `field`; `None` keeps id order
    fn sort_value(&self, field: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub ascending: bool,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), ascending: true }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), ascending: false }
    }
}

/// Page/size/sort specification; `page` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn of(page: u64, size: u64) -> Self {
        Self { page, size, sort: None }
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Stores must not fetch unbounded pages.
    pub fn normalized_size(&self) -> u64 {
        self.size.clamp(1, 100)
    }
}

/// One page of results plus the metadata the store reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Persistence port for one table.
#[async_trait]
pub trait EntityStore<E: Record>: Send + Sync {
    /// Page of rows in the requested order, with the unpaged total count.
    async fn find_page(&self, req: &PageRequest) -> Result<Page<E>, StoreError>;

    /// Full row with association members loaded, or `None`.
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, StoreError>;

    /// Identity-only handle; no I/O, no existence check (deferred to commit).
    fn get_ref(&self, id: i64) -> EntityRef<E> {
        EntityRef::new(id)
    }

    /// Upsert as one atomic unit: assigns an id on first insert, otherwise
    /// overwrites the row with that id (`NoSuchRow` when it is gone), and
    /// replaces the association links with the entity's current link set.
    /// Link ids that do not exist fail here, as `Integrity`.
    async fn save(&self, entity: E) -> Result<E, StoreError>;

    /// `NoSuchRow` when nothing was deleted; `Integrity` when a dependent
    /// row blocks the delete. Either way storage is left unchanged.
    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;
}

impl Record for Product {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn link_ids(&self) -> Vec<i64> {
        self.categories.iter().filter_map(|c| c.id).collect()
    }
    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "img_url" => Some(self.img_url.clone()),
            _ => None,
        }
    }
}

impl Record for Category {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn link_ids(&self) -> Vec<i64> {
        Vec::new()
    }
    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }
}

impl Record for User {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn link_ids(&self) -> Vec<i64> {
        self.roles.iter().filter_map(|r| r.id).collect()
    }
    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "first_name" => Some(self.first_name.clone()),
            "last_name" => Some(self.last_name.clone()),
            "email" => Some(self.email.clone()),
            _ => None,
        }
    }
}

impl Record for Role {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn link_ids(&self) -> Vec<i64> {
        Vec::new()
    }
    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "authority" => Some(self.authority.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_size() {
        assert_eq!(PageRequest::of(0, 0).normalized_size(), 1);
        assert_eq!(PageRequest::of(0, 12).normalized_size(), 12);
        assert_eq!(PageRequest::of(0, 1000).normalized_size(), 100);
    }

    #[test]
    fn page_map_keeps_metadata() {
        let page = Page { content: vec![1, 2, 3], page: 2, size: 3, total_elements: 9 };
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.content, vec!["1", "2", "3"]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_elements, 9);
    }

    #[test]
    fn product_links_skip_unsaved_members() {
        let mut p = Product::default();
        p.categories = vec![
            Category { id: Some(7), name: "Books".into() },
            Category { id: None, name: "draft".into() },
        ];
        assert_eq!(p.link_ids(), vec![7]);
    }
}
