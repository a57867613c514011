use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{ImdbId, PosterUrl};

/// Terminal state of one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Persisted { poster: PosterUrl },
    NotFound,
    TransportError { reason: String },
    WriteFailed { poster: PosterUrl, reason: String },
    /// Dequeued, then abandoned because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub imdb_id: ImdbId,
    pub worker: usize,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Tally of one backfill run, assembled from the workers' results channel.
///
/// A run that returns a report succeeded, whatever the counts say.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillReport {
    pub selected: usize,
    pub workers: usize,
    /// Lookups that produced a poster, whether or not it was stored.
    pub resolved: usize,
    pub persisted: usize,
    pub not_found: usize,
    pub transport_errors: usize,
    pub write_errors: usize,
    pub cancelled: usize,
    /// Selected but never reported. Either the run was cancelled before a
    /// worker reached them, or a worker stopped abnormally (see
    /// `failed_workers`).
    pub skipped: usize,
    /// Workers that panicked instead of draining the queue.
    pub failed_workers: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items: Vec<ItemReport>,
}

impl BackfillReport {
    pub(crate) fn collect(
        selected: usize,
        workers: usize,
        items: Vec<ItemReport>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut report = Self {
            selected,
            workers,
            resolved: 0,
            persisted: 0,
            not_found: 0,
            transport_errors: 0,
            write_errors: 0,
            cancelled: 0,
            skipped: selected.saturating_sub(items.len()),
            failed_workers: 0,
            started_at,
            finished_at: Utc::now(),
            items: Vec::new(),
        };

        for item in &items {
            match item.status {
                ItemStatus::Persisted { .. } => report.persisted += 1,
                ItemStatus::NotFound => report.not_found += 1,
                ItemStatus::TransportError { .. } => report.transport_errors += 1,
                ItemStatus::WriteFailed { .. } => report.write_errors += 1,
                ItemStatus::Cancelled => report.cancelled += 1,
            }
        }
        report.resolved = report.persisted + report.write_errors;
        report.items = items;
        report
    }

    /// Lookups that reached the service, whatever their outcome.
    pub fn attempted(&self) -> usize {
        self.items.len() - self.cancelled
    }

    pub fn item(&self, id: &ImdbId) -> Option<&ItemReport> {
        self.items.iter().find(|item| &item.imdb_id == id)
    }
}
