//! Domain view of the catalog data.
//!
//! Instances are transient: read (or built) at the start of one service call
//! and discarded once the response DTO exists. Nothing here is cached or
//! shared across calls.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};

/// Lightweight pointer to a stored row, obtained without checking that the
/// row currently exists. Existence is only verified when a save commits.
pub struct EntityRef<E> {
    pub id: i64,
    marker: PhantomData<fn() -> E>,
}

impl<E> EntityRef<E> {
    pub fn new(id: i64) -> Self {
        Self { id, marker: PhantomData }
    }
}

impl<E> Clone for EntityRef<E> {
    fn clone(&self) -> Self {
        Self::new(self.id)
    }
}

impl<E> Copy for EntityRef<E> {}

impl<E> fmt::Debug for EntityRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.id)
    }
}

/// Leaf entity; carries no back-reference to products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Role {
    pub id: Option<i64>,
    pub authority: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Assigned by the store on first successful insert; never reassigned.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    pub date: DateTime<Utc>,
    /// Complete current category set; no duplicates, order not meaningful.
    pub categories: Vec<Category>,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            price: 0.0,
            img_url: String::new(),
            date: DateTime::<Utc>::UNIX_EPOCH,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Hashed credential; set on insert only and preserved across updates.
    pub password: String,
    /// Complete current role set; no duplicates, order not meaningful.
    pub roles: Vec<Role>,
}

// Members attached from a ref carry only the id; the store persists the link
// and never reads the display fields on the write path.
impl From<EntityRef<Category>> for Category {
    fn from(r: EntityRef<Category>) -> Self {
        Category { id: Some(r.id), name: String::new() }
    }
}

impl From<EntityRef<Role>> for Role {
    fn from(r: EntityRef<Role>) -> Self {
        Role { id: Some(r.id), authority: String::new() }
    }
}
