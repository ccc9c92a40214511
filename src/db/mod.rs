//! Database module: models, schema and the SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and the forms that write them
//! - `record.rs`: record-to-field-map conversion used by JSON responses
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `AgencyStore`, the query layer over the pool

pub mod models;
pub mod record;
pub mod schema;
pub mod sqlite;

pub use models::{Contact, Letter, Policy, User};
pub use record::{AsFieldMap, FieldMap};
pub use schema::SQLITE_INIT;
pub use sqlite::{AgencyStore, SqlitePool};
