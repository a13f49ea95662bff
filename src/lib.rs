//! `vocab_store` - ordered vocabulary lists with undo/redo, persisted in `SQLite`.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`storage`] - `SQLite` database layer, schema versions, list registry
//! - [`list`] - In-memory word lists, reversible commands and undo stacks
//! - [`model`] - Data types (Entry, ListInfo, ListSummary, SearchHit)
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`logging`] - Tracing subscriber setup
//! - [`cli`] - Command-line interface using clap

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod list;
pub mod logging;
pub mod model;
pub mod storage;

pub use config::StoreConfig;
pub use error::{ErrorCode, Result, VocabError};
pub use list::WordList;
pub use model::{Entry, EntryProperty, ListId, ListInfo, ListSummary, PropertyValue, SearchHit};
pub use storage::Store;
