//! Row-level persistence entities for the catalog schema.
//!
//! These mirror the tables created by the `migration` crate. Business rules
//! and the domain view of the data live in the `service` crate; this crate
//! only knows about columns, relations and connections.

pub mod db;
pub mod category;
pub mod product;
pub mod product_category;
pub mod role;
pub mod user;
pub mod user_role;

#[cfg(test)]
mod tests;
