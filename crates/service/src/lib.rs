//! Catalog service layer: domain model, transfer shapes, the persistence
//! port and the generic CRUD services instantiated for the product, user
//! and category aggregates.
//! - Translation between entities and DTOs is pure; integrity checks are
//!   deferred to the store's commit boundary.
//! - Association updates are full replacements, never merges.
//! - Persistence failures map onto a stable three-kind error taxonomy.

pub mod errors;
pub mod domain;
pub mod dto;
pub mod repository;
pub mod repo;
pub mod crud;
pub mod category;
pub mod product;
pub mod user;

#[cfg(test)]
pub mod test_support;
