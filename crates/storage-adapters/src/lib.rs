//! # storage-adapters
//!
//! Entity Store implementations of the `domains` repository ports.
//! `MemoryStore` is always compiled; `PgStore` needs the `db-postgres` feature.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
