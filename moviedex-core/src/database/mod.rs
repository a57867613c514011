//! Catalog storage.
//!
//! The [`CatalogRepository`] port is what the backfill pipeline and the
//! server surfaces depend on; [`SqliteCatalog`] is the pooled adapter used in
//! production and tests.

pub mod ports;
pub mod sqlite;

pub use ports::CatalogRepository;
pub use sqlite::SqliteCatalog;
