//! Poster backfill.
//!
//! A run selects up to `limit` records whose poster is unset, loads every
//! identifier into a work channel sized to the selection, and lets a fixed
//! pool of workers resolve them through the lookup service. Each worker
//! persists resolved posters itself. The run returns once every worker has
//! drained the channel and exited.
//!
//! Only a failed selection fails a run. Lookup misses, transport failures
//! and write failures are logged, tallied in the [`BackfillReport`], and
//! otherwise dropped; nothing is retried.

mod report;
mod worker;

use std::{collections::HashSet, fmt, num::NonZeroUsize, sync::Arc};

use chrono::Utc;
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use report::{BackfillReport, ItemReport, ItemStatus};

use crate::{
    database::CatalogRepository, error::PipelineError, providers::PosterLookup,
    types::ImdbId,
};
use worker::Worker;

pub const DEFAULT_WORKERS: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on concurrent lookups.
    pub workers: NonZeroUsize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(workers: NonZeroUsize) -> Self {
        Self { workers }
    }
}

pub struct PosterBackfill {
    catalog: Arc<dyn CatalogRepository>,
    lookup: Arc<dyn PosterLookup>,
    config: PipelineConfig,
}

impl fmt::Debug for PosterBackfill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterBackfill")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PosterBackfill {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        lookup: Arc<dyn PosterLookup>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            catalog,
            lookup,
            config,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Runs one backfill over at most `limit` records, to completion.
    pub async fn run(&self, limit: u32) -> Result<BackfillReport, PipelineError> {
        self.run_until_cancelled(limit, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops handing out work once `cancel`
    /// fires. In-flight lookups are abandoned and reported as cancelled;
    /// identifiers never reported are counted as skipped.
    pub async fn run_until_cancelled(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<BackfillReport, PipelineError> {
        let candidates = self.select_candidates(limit).await?;
        Ok(self.dispatch(candidates, cancel).await)
    }

    /// Identifiers of up to `limit` records lacking a poster, de-duplicated
    /// in selection order.
    pub async fn select_candidates(
        &self,
        limit: u32,
    ) -> Result<Vec<ImdbId>, PipelineError> {
        let ids = self.catalog.ids_missing_poster(limit).await.map_err(|err| {
            error!(limit, error = %err, "poster backfill candidate selection failed");
            PipelineError::StorageUnavailable(err)
        })?;

        let mut seen = HashSet::with_capacity(ids.len());
        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(id.clone()) {
                candidates.push(id);
            }
        }
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    /// Fans `candidates` out to the worker pool and waits for every worker
    /// to finish.
    pub async fn dispatch(
        &self,
        candidates: Vec<ImdbId>,
        cancel: CancellationToken,
    ) -> BackfillReport {
        let started_at = Utc::now();
        let selected = candidates.len();
        let workers = self.config.workers.get();

        info!(selected, workers, "poster backfill started");

        if selected == 0 {
            let report = BackfillReport::collect(0, workers, Vec::new(), started_at);
            info!("poster backfill finished: nothing to do");
            return report;
        }

        // Sized to the whole selection so pushing never waits on workers.
        let (work_tx, work_rx) = async_channel::bounded::<ImdbId>(selected);
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ItemReport>();

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let worker = Worker {
                id,
                catalog: Arc::clone(&self.catalog),
                lookup: Arc::clone(&self.lookup),
                work_rx: work_rx.clone(),
                results: result_tx.clone(),
                cancel: cancel.clone(),
            };
            pool.spawn(worker.run());
        }
        drop(work_rx);
        drop(result_tx);

        let mut queued = 0usize;
        for imdb_id in candidates {
            // Fails only once every worker has exited.
            if work_tx.try_send(imdb_id).is_err() {
                debug!(queued, selected, "work channel closed before queueing finished");
                break;
            }
            queued += 1;
        }
        work_tx.close();

        let mut items = Vec::with_capacity(selected);
        while let Some(item) = result_rx.recv().await {
            items.push(item);
        }

        let mut failed_workers = 0;
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                failed_workers += 1;
                warn!(error = %err, "backfill worker terminated abnormally");
            }
        }

        let mut report = BackfillReport::collect(selected, workers, items, started_at);
        report.failed_workers = failed_workers;
        info!(
            selected = report.selected,
            persisted = report.persisted,
            not_found = report.not_found,
            transport_errors = report.transport_errors,
            write_errors = report.write_errors,
            cancelled = report.cancelled,
            skipped = report.skipped,
            failed_workers = report.failed_workers,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "poster backfill finished"
        );
        report
    }
}
