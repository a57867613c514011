use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ImdbId, PosterUrl};

pub const OMDB_DEFAULT_BASE_URL: &str = "http://www.omdbapi.com/";

/// Token the lookup service uses for "no poster on file".
const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    Status(reqwest::StatusCode),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Classification of one lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupOutcome {
    Resolved(PosterUrl),
    NotFound,
    TransportError(String),
}

impl From<LookupError> for LookupOutcome {
    fn from(err: LookupError) -> Self {
        Self::TransportError(err.to_string())
    }
}

/// Port for the external poster lookup service.
///
/// Implementations never fail: every response, including transport
/// failures, is folded into a [`LookupOutcome`]. No retries are expected.
#[async_trait]
pub trait PosterLookup: Send + Sync {
    async fn lookup(&self, id: &ImdbId) -> LookupOutcome;
}

/// Maps the raw `Poster` field of a successful response to an outcome.
///
/// Only the exact `n/a` token (any case) means "no poster"; a padded token
/// is an ordinary value and is kept verbatim.
pub fn classify_poster(raw: Option<String>) -> LookupOutcome {
    match raw {
        None => LookupOutcome::NotFound,
        Some(value) if value.eq_ignore_ascii_case(NOT_AVAILABLE) => {
            LookupOutcome::NotFound
        }
        Some(value) => match PosterUrl::parse(value) {
            Ok(url) => LookupOutcome::Resolved(url),
            Err(_) => LookupOutcome::NotFound,
        },
    }
}

#[derive(Debug, Deserialize)]
struct OmdbTitle {
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
}

#[derive(Debug, Serialize)]
struct OmdbTitleQuery<'a> {
    i: &'a str,
    apikey: &'a str,
}

#[derive(Clone)]
pub struct OmdbSettings {
    pub base_url: String,
    pub api_key: String,
    /// `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl OmdbSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: OMDB_DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for OmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// OMDb-compatible poster lookup client.
pub struct OmdbProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for OmdbProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OmdbProvider {
    pub fn new(settings: OmdbSettings) -> Result<Self, LookupError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url,
            api_key: settings.api_key,
        })
    }

    /// Fetches the raw `Poster` field for `id`.
    async fn fetch_poster_field(
        &self,
        id: &ImdbId,
    ) -> Result<Option<String>, LookupError> {
        let query = OmdbTitleQuery {
            i: id.as_str(),
            apikey: &self.api_key,
        };

        let response = self.http.get(&self.base_url).query(&query).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LookupError::Status(status));
        }

        let body = response.bytes().await?;
        let title: OmdbTitle = serde_json::from_slice(&body)?;
        Ok(title.poster)
    }
}

#[async_trait]
impl PosterLookup for OmdbProvider {
    async fn lookup(&self, id: &ImdbId) -> LookupOutcome {
        match self.fetch_poster_field(id).await {
            Ok(raw) => classify_poster(raw),
            Err(err) => {
                debug!(imdb_id = %id, error = %err, "poster lookup failed");
                err.into()
            }
        }
    }
}
