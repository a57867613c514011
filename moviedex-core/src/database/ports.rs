use async_trait::async_trait;

use crate::{
    error::Result,
    types::{ImdbId, ListQuery, Movie, NewMovie, PosterUrl},
};

/// Repository port for catalog records.
///
/// Implementations are shared by every backfill worker at once, so they must
/// be safe for concurrent use (a pooled handle or an internally serialized
/// writer).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Identifiers of up to `limit` records whose poster is unset.
    ///
    /// A failed read is reported as [`CatalogError::Unavailable`].
    ///
    /// [`CatalogError::Unavailable`]: crate::CatalogError::Unavailable
    async fn ids_missing_poster(&self, limit: u32) -> Result<Vec<ImdbId>>;

    /// Sets the poster of the record matching `id` and returns the number of
    /// rows affected. An unknown identifier affects zero rows and is not an
    /// error.
    async fn set_poster(&self, id: &ImdbId, url: &PosterUrl) -> Result<u64>;

    async fn add_movie(&self, movie: &NewMovie) -> Result<()>;

    async fn list_movies(&self, query: &ListQuery) -> Result<Vec<Movie>>;

    async fn get_movie(&self, id: &ImdbId) -> Result<Option<Movie>>;

    /// Returns `false` when no record matched.
    async fn delete_movie(&self, id: &ImdbId) -> Result<bool>;

    /// Like [`set_poster`](Self::set_poster), but reports whether a record
    /// matched.
    async fn update_poster(&self, id: &ImdbId, url: &PosterUrl) -> Result<bool> {
        Ok(self.set_poster(id, url).await? > 0)
    }
}
