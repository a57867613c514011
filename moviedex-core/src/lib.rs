//! # Moviedex Core
//!
//! Core library for Moviedex, providing the catalog types, the storage port
//! with its SQLite adapter, the OMDb lookup client, and the poster backfill
//! pipeline.
//!
//! ## Overview
//!
//! - **Catalog**: [`types::Movie`] records keyed by an externally assigned
//!   [`types::ImdbId`], with an optional [`types::PosterUrl`]
//! - **Storage**: the [`database::CatalogRepository`] port and the pooled
//!   [`database::SqliteCatalog`] adapter
//! - **Lookups**: the [`providers::PosterLookup`] port and the
//!   [`providers::OmdbProvider`] HTTP client
//! - **Backfill**: [`backfill::PosterBackfill`], which selects records lacking
//!   a poster and resolves them through a bounded worker pool
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use moviedex_core::{
//!     backfill::{PipelineConfig, PosterBackfill},
//!     database::SqliteCatalog,
//!     providers::{OmdbProvider, OmdbSettings},
//! };
//!
//! async fn backfill() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = SqliteCatalog::connect("sqlite://movies.db", 5).await?;
//!     catalog.migrate().await?;
//!
//!     let lookup = OmdbProvider::new(OmdbSettings::new("my-api-key"))?;
//!     let pipeline = PosterBackfill::new(
//!         Arc::new(catalog),
//!         Arc::new(lookup),
//!         PipelineConfig::default(),
//!     );
//!
//!     let report = pipeline.run(25).await?;
//!     println!("persisted {} posters", report.persisted);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Poster backfill pipeline (selector, dispatcher, worker pool)
pub mod backfill;

/// Catalog storage port and SQLite adapter
pub mod database;

/// Error taxonomy shared across the crate
pub mod error;

/// External lookup service clients
pub mod providers;

/// Catalog domain types
pub mod types;

pub use error::{CatalogError, PipelineError, Result};

/// Embedded schema migrations for the catalog database.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
