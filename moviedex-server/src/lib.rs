//! # Moviedex Server
//!
//! REST and command-line surfaces over the Moviedex catalog.
//!
//! The server exposes catalog CRUD under `/movies` and triggers the poster
//! backfill pipeline through `POST /posters/backfill`. The `moviedex` binary
//! offers the same operations as subcommands and serves the REST API when
//! invoked without one.

pub mod cli;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
