use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::{debug, info, warn};

use crate::{
    MIGRATOR,
    database::ports::CatalogRepository,
    error::{CatalogError, Result},
    types::{ImdbId, ListQuery, Movie, NewMovie, PosterUrl},
};

/// Pooled SQLite catalog.
///
/// Cloning shares the pool. Each concurrent caller checks out its own
/// connection; with WAL mode and a busy timeout, concurrent writers wait for
/// the lock instead of failing.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalog")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    #[sqlx(rename = "IMDb_id")]
    imdb_id: String,
    #[sqlx(rename = "Title")]
    title: String,
    #[sqlx(rename = "Year")]
    year: i32,
    #[sqlx(rename = "Rating")]
    rating: f64,
    #[sqlx(rename = "Poster")]
    poster: Option<String>,
}

impl MovieRow {
    fn into_movie(self) -> Result<Movie> {
        Ok(Movie {
            imdb_id: ImdbId::from_stored(self.imdb_id)?,
            title: self.title,
            year: self.year,
            rating: self.rating,
            // Blank values written by other tools read back as unset.
            poster: self.poster.and_then(|p| PosterUrl::parse(p).ok()),
        })
    }
}

impl SqliteCatalog {
    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                CatalogError::Unavailable(format!(
                    "Invalid database URL {database_url}: {e}"
                ))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| {
                CatalogError::Unavailable(format!("Database connection failed: {e}"))
            })?;

        info!(
            max_connections = max_connections.max(1),
            "catalog database pool initialized"
        );

        Ok(Self { pool })
    }

    /// Private in-memory database on a single long-lived connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            CatalogError::Unavailable(format!("Invalid in-memory database URL: {e}"))
        })?;

        // Each connection to `:memory:` is a separate database, so the pool
        // must hold exactly one and never recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                CatalogError::Unavailable(format!("Database connection failed: {e}"))
            })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        debug!("catalog migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalog {
    async fn ids_missing_poster(&self, limit: u32) -> Result<Vec<ImdbId>> {
        let raw_ids: Vec<String> = sqlx::query_scalar(
            "SELECT IMDb_id FROM movies \
             WHERE (Poster IS NULL OR TRIM(Poster) = '') AND TRIM(IMDb_id) <> '' \
             ORDER BY IMDb_id LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            CatalogError::Unavailable(format!(
                "Failed to select movies without posters: {e}"
            ))
        })?;

        let mut ids = Vec::with_capacity(raw_ids.len());
        for raw in raw_ids {
            match ImdbId::from_stored(raw) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(error = %e, "skipping catalog row"),
            }
        }
        Ok(ids)
    }

    async fn set_poster(&self, id: &ImdbId, url: &PosterUrl) -> Result<u64> {
        let result = sqlx::query("UPDATE movies SET Poster = ? WHERE IMDb_id = ?")
            .bind(url.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                CatalogError::Write(format!("Failed to update poster for {id}: {e}"))
            })?;

        Ok(result.rows_affected())
    }

    async fn add_movie(&self, movie: &NewMovie) -> Result<()> {
        movie.validate()?;

        sqlx::query(
            "INSERT INTO movies (IMDb_id, Title, Year, Rating) VALUES (?, ?, ?, ?)",
        )
        .bind(movie.imdb_id.as_str())
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.rating)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CatalogError::Conflict(movie.imdb_id.to_string())
            }
            _ => CatalogError::Write(format!(
                "Failed to add movie {}: {e}",
                movie.imdb_id
            )),
        })?;

        Ok(())
    }

    async fn list_movies(&self, query: &ListQuery) -> Result<Vec<Movie>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT IMDb_id, Title, Year, Rating, Poster FROM movies",
        );

        if let Some(year) = query.year {
            builder.push(" WHERE Year = ").push_bind(year);
        }

        if let Some(sort) = query.sort {
            builder
                .push(" ORDER BY ")
                .push(sort.column())
                .push(" ")
                .push(query.order.keyword());
        }

        let rows = builder
            .build_query_as::<MovieRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                CatalogError::Unavailable(format!("Failed to list movies: {e}"))
            })?;

        rows.into_iter().map(MovieRow::into_movie).collect()
    }

    async fn get_movie(&self, id: &ImdbId) -> Result<Option<Movie>> {
        let row: Option<MovieRow> = sqlx::query_as(
            "SELECT IMDb_id, Title, Year, Rating, Poster FROM movies WHERE IMDb_id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            CatalogError::Unavailable(format!("Failed to get movie {id}: {e}"))
        })?;

        row.map(MovieRow::into_movie).transpose()
    }

    async fn delete_movie(&self, id: &ImdbId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE IMDb_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                CatalogError::Write(format!("Failed to delete movie {id}: {e}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
