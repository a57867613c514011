#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use moviedex_core::{
    CatalogError,
    database::{CatalogRepository, SqliteCatalog},
    providers::{LookupOutcome, PosterLookup},
    types::{ImdbId, ListQuery, Movie, NewMovie, PosterUrl},
};
use serde_json::{Value, json};
use tokio::{sync::oneshot, task::JoinHandle};

pub fn id(raw: &str) -> ImdbId {
    ImdbId::parse(raw).expect("valid imdb id")
}

pub fn poster(raw: &str) -> PosterUrl {
    PosterUrl::parse(raw).expect("valid poster url")
}

pub async fn memory_catalog() -> Result<SqliteCatalog> {
    let catalog = SqliteCatalog::in_memory()
        .await
        .context("open in-memory catalog")?;
    catalog.migrate().await.context("migrate catalog")?;
    Ok(catalog)
}

/// Inserts one movie per identifier; `Some` posters are written afterwards.
pub async fn seed_movies(
    catalog: &SqliteCatalog,
    movies: &[(&str, Option<&str>)],
) -> Result<()> {
    for (index, (raw_id, raw_poster)) in movies.iter().enumerate() {
        let movie = NewMovie {
            imdb_id: id(raw_id),
            title: format!("Movie {raw_id}"),
            year: 1990 + index as i32,
            rating: 5.0 + index as f64 / 10.0,
        };
        catalog.add_movie(&movie).await?;
        if let Some(raw_poster) = raw_poster {
            catalog.set_poster(&movie.imdb_id, &poster(raw_poster)).await?;
        }
    }
    Ok(())
}

pub async fn poster_of(catalog: &SqliteCatalog, raw_id: &str) -> Option<PosterUrl> {
    catalog
        .get_movie(&id(raw_id))
        .await
        .expect("read movie")
        .expect("movie exists")
        .poster
}

/// In-process lookup with canned outcomes, recording every call and the peak
/// number of concurrent calls.
#[derive(Default)]
pub struct ScriptedLookup {
    outcomes: HashMap<ImdbId, LookupOutcome>,
    delay: Duration,
    panics: HashSet<ImdbId>,
    calls: Mutex<Vec<ImdbId>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(mut self, raw_id: &str, raw_poster: &str) -> Self {
        self.outcomes
            .insert(id(raw_id), LookupOutcome::Resolved(poster(raw_poster)));
        self
    }

    pub fn fail(mut self, raw_id: &str, reason: &str) -> Self {
        self.outcomes
            .insert(id(raw_id), LookupOutcome::TransportError(reason.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the lookup for `raw_id` panic, taking its worker down with it.
    pub fn panic_on(mut self, raw_id: &str) -> Self {
        self.panics.insert(id(raw_id));
        self
    }

    pub fn calls(&self) -> Vec<ImdbId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PosterLookup for ScriptedLookup {
    async fn lookup(&self, imdb_id: &ImdbId) -> LookupOutcome {
        self.calls.lock().unwrap().push(imdb_id.clone());
        if self.panics.contains(imdb_id) {
            panic!("lookup for {imdb_id} blew up");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.outcomes
            .get(imdb_id)
            .cloned()
            .unwrap_or(LookupOutcome::NotFound)
    }
}

/// Catalog wrapper whose poster writes fail for selected identifiers.
pub struct FailingWrites {
    pub inner: SqliteCatalog,
    pub fail: HashSet<ImdbId>,
}

#[async_trait]
impl CatalogRepository for FailingWrites {
    async fn ids_missing_poster(&self, limit: u32) -> moviedex_core::Result<Vec<ImdbId>> {
        self.inner.ids_missing_poster(limit).await
    }

    async fn set_poster(
        &self,
        imdb_id: &ImdbId,
        url: &PosterUrl,
    ) -> moviedex_core::Result<u64> {
        if self.fail.contains(imdb_id) {
            return Err(CatalogError::Write(format!(
                "Failed to update poster for {imdb_id}: database is locked"
            )));
        }
        self.inner.set_poster(imdb_id, url).await
    }

    async fn add_movie(&self, movie: &NewMovie) -> moviedex_core::Result<()> {
        self.inner.add_movie(movie).await
    }

    async fn list_movies(&self, query: &ListQuery) -> moviedex_core::Result<Vec<Movie>> {
        self.inner.list_movies(query).await
    }

    async fn get_movie(&self, imdb_id: &ImdbId) -> moviedex_core::Result<Option<Movie>> {
        self.inner.get_movie(imdb_id).await
    }

    async fn delete_movie(&self, imdb_id: &ImdbId) -> moviedex_core::Result<bool> {
        self.inner.delete_movie(imdb_id).await
    }
}

/// Canned reply served by [`LookupStub`] for one identifier.
#[derive(Debug, Clone)]
pub enum StubReply {
    Json(Value),
    Status(u16, Value),
    Raw(&'static str),
}

#[derive(Clone)]
struct StubState {
    replies: Arc<HashMap<String, StubReply>>,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Local HTTP stand-in for the OMDb service. Unknown identifiers get the
/// service's "Incorrect IMDb ID" body.
pub struct LookupStub {
    url: String,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl LookupStub {
    pub async fn start(replies: Vec<(&str, StubReply)>) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind lookup stub listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read lookup stub address")?;

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            replies: Arc::new(
                replies
                    .into_iter()
                    .map(|(key, reply)| (key.to_string(), reply))
                    .collect(),
            ),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().route("/", get(serve_lookup)).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = server.await {
                eprintln!("lookup stub stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{addr}/"),
            requests,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn serve_lookup(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(params.clone());

    let key = params.get("i").cloned().unwrap_or_default();
    match state.replies.get(&key) {
        Some(StubReply::Json(body)) => Json(body.clone()).into_response(),
        Some(StubReply::Status(code, body)) => {
            let status =
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body.clone())).into_response()
        }
        Some(StubReply::Raw(body)) => (StatusCode::OK, *body).into_response(),
        None => Json(json!({ "Response": "False", "Error": "Incorrect IMDb ID." }))
            .into_response(),
    }
}

pub fn poster_body(raw_poster: &str) -> StubReply {
    StubReply::Json(json!({
        "Title": "Stub",
        "Poster": raw_poster,
        "Response": "True",
    }))
}
