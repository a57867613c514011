use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    backfill::report::{ItemReport, ItemStatus},
    database::CatalogRepository,
    providers::{LookupOutcome, PosterLookup},
    types::ImdbId,
};

/// One member of the backfill pool.
///
/// Drains the shared work channel one identifier at a time until the channel
/// is closed and empty, or the run is cancelled.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) catalog: Arc<dyn CatalogRepository>,
    pub(crate) lookup: Arc<dyn PosterLookup>,
    pub(crate) work_rx: async_channel::Receiver<ImdbId>,
    pub(crate) results: mpsc::UnboundedSender<ItemReport>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    pub(crate) async fn run(self) {
        loop {
            let imdb_id = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(worker = self.id, "backfill worker cancelled");
                    break;
                }
                next = self.work_rx.recv() => match next {
                    Ok(imdb_id) => imdb_id,
                    // Closed and drained.
                    Err(_) => break,
                },
            };

            let status = self.process(&imdb_id).await;
            let report = ItemReport {
                imdb_id,
                worker: self.id,
                status,
            };
            if self.results.send(report).is_err() {
                break;
            }
        }

        trace!(worker = self.id, "backfill worker exiting");
    }

    async fn process(&self, imdb_id: &ImdbId) -> ItemStatus {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return ItemStatus::Cancelled,
            outcome = self.lookup.lookup(imdb_id) => outcome,
        };

        let poster = match outcome {
            LookupOutcome::Resolved(poster) => poster,
            LookupOutcome::NotFound => {
                debug!(worker = self.id, imdb_id = %imdb_id, "no poster available");
                return ItemStatus::NotFound;
            }
            LookupOutcome::TransportError(reason) => {
                warn!(worker = self.id, imdb_id = %imdb_id, %reason, "poster lookup failed");
                return ItemStatus::TransportError { reason };
            }
        };

        if self.cancel.is_cancelled() {
            return ItemStatus::Cancelled;
        }

        match self.catalog.set_poster(imdb_id, &poster).await {
            Ok(rows) => {
                debug!(
                    worker = self.id,
                    imdb_id = %imdb_id,
                    poster = %poster,
                    rows,
                    "poster persisted"
                );
                ItemStatus::Persisted { poster }
            }
            Err(err) => {
                warn!(worker = self.id, imdb_id = %imdb_id, error = %err, "poster write failed");
                ItemStatus::WriteFailed {
                    poster,
                    reason: err.to_string(),
                }
            }
        }
    }
}
