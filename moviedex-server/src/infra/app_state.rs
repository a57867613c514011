use std::{fmt, sync::Arc};

use moviedex_core::{backfill::PosterBackfill, database::CatalogRepository};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    /// Absent when no lookup credential is configured.
    pub backfill: Option<Arc<PosterBackfill>>,
    /// Fired on process shutdown; in-flight backfill runs stop with it.
    pub shutdown: CancellationToken,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("backfill_enabled", &self.backfill.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        backfill: Option<Arc<PosterBackfill>>,
    ) -> Self {
        Self {
            catalog,
            backfill,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
