//! `SQLite` storage layer for `vocab_store`.
//!
//! This module provides the persistence layer using `SQLite` with:
//! - One shared connection and one transaction primitive for every write
//! - Versioned schema with ordered upgrade steps
//! - Position-consistent entry tables (positions always `0..count`)
//! - A list registry with an identity cache of live lists
//!
//! # Submodules
//!
//! - [`db`] - Connection wrapper and `mutate` transaction primitive
//! - [`schema`] - Schema definitions and version upgrades
//! - [`table`] - Ordered entry table for one list
//! - [`store`] - List registry, metadata, search and deletion

pub mod db;
pub mod schema;
pub mod store;
pub mod table;

pub use db::Database;
pub use store::Store;
pub use table::OrderedEntryTable;
