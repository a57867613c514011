use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage write failed: {0}")]
    Write(String),

    #[error("Movie already exists: {0}")]
    Conflict(String),

    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures that abort a backfill run.
///
/// Per-item lookup and write failures never surface here; they are recorded
/// in the run's report instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Candidate selection failed: {0}")]
    StorageUnavailable(#[source] CatalogError),
}
