//! Database module: records and repository functions for persistent storage.
//!
//! Layout:
//! - `models.rs`: plain structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: `LogbookStorage`, the repository over a SQLite pool

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbSession, Post, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{LogbookStorage, SqlitePool};
