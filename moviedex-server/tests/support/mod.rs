#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use moviedex_core::{
    backfill::{PipelineConfig, PosterBackfill},
    database::{CatalogRepository, SqliteCatalog},
    providers::{LookupOutcome, PosterLookup},
    types::{ImdbId, NewMovie, PosterUrl},
};
use moviedex_server::{AppState, routes::create_app};

/// Lookup answering from a fixed table; unknown identifiers are not found.
#[derive(Debug, Default)]
pub struct FixedLookup {
    posters: HashMap<String, String>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl FixedLookup {
    pub fn with_poster(mut self, imdb_id: &str, url: &str) -> Self {
        self.posters.insert(imdb_id.to_string(), url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared count of finished lookups, readable after the lookup has been
    /// moved into the app.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PosterLookup for FixedLookup {
    async fn lookup(&self, imdb_id: &ImdbId) -> LookupOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self
            .posters
            .get(imdb_id.as_str())
            .and_then(|url| PosterUrl::parse(url.as_str()).ok())
        {
            Some(poster) => LookupOutcome::Resolved(poster),
            None => LookupOutcome::NotFound,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub catalog: SqliteCatalog,
    pub state: AppState,
}

/// Serves the full router over a fresh in-memory catalog. Without a lookup
/// the backfill endpoint is disabled, as when no credential is configured.
pub async fn build_test_app(lookup: Option<FixedLookup>) -> Result<TestApp> {
    let catalog = SqliteCatalog::in_memory()
        .await
        .context("failed to open in-memory catalog")?;
    catalog.migrate().await.context("failed to migrate catalog")?;

    let backfill = lookup.map(|lookup| {
        Arc::new(PosterBackfill::new(
            Arc::new(catalog.clone()),
            Arc::new(lookup),
            PipelineConfig::default(),
        ))
    });
    let state = AppState::new(Arc::new(catalog.clone()), backfill);

    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(TestApp {
        server,
        catalog,
        state,
    })
}

pub async fn seed(
    catalog: &SqliteCatalog,
    raw_id: &str,
    title: &str,
    year: i32,
    rating: f64,
) {
    catalog
        .add_movie(&NewMovie {
            imdb_id: ImdbId::parse(raw_id).expect("valid id"),
            title: title.to_string(),
            year,
            rating,
        })
        .await
        .expect("seed movie");
}
