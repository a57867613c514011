//! Catalog operations behind the `moviedex` subcommands.
//!
//! Each function performs one operation and returns the text to print, so
//! the binary only has to parse arguments and write to stdout.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use moviedex_core::{
    backfill::{BackfillReport, ItemStatus, PosterBackfill},
    database::CatalogRepository,
    types::{ImdbId, ListQuery, Movie, NewMovie, PosterUrl},
};
use tokio_util::sync::CancellationToken;

/// Multi-line detail view of one record. An unset poster prints as `null`.
pub fn format_movie(movie: &Movie) -> String {
    format!(
        "IMDb id: {}\nTitle: {}\nRating: {:.1}\nYear: {}\nPoster: {}",
        movie.imdb_id,
        movie.title,
        movie.rating,
        movie.year,
        movie.poster.as_ref().map(PosterUrl::as_str).unwrap_or("null"),
    )
}

pub fn format_report(report: &BackfillReport) -> String {
    let mut out = format!(
        "Selected {} movies without a poster ({} workers)\n\
         Persisted: {}\nNot found: {}\nLookup errors: {}\nWrite errors: {}",
        report.selected,
        report.workers,
        report.persisted,
        report.not_found,
        report.transport_errors,
        report.write_errors,
    );
    if report.cancelled > 0 || report.skipped > 0 {
        let _ = write!(
            out,
            "\nCancelled: {}\nSkipped: {}",
            report.cancelled, report.skipped
        );
    }
    if report.failed_workers > 0 {
        let _ = write!(out, "\nFailed workers: {}", report.failed_workers);
    }
    for item in &report.items {
        let line = match &item.status {
            ItemStatus::Persisted { poster } => format!("{}: {poster}", item.imdb_id),
            ItemStatus::NotFound => format!("{}: no poster available", item.imdb_id),
            ItemStatus::TransportError { reason } => {
                format!("{}: lookup failed ({reason})", item.imdb_id)
            }
            ItemStatus::WriteFailed { reason, .. } => {
                format!("{}: write failed ({reason})", item.imdb_id)
            }
            ItemStatus::Cancelled => format!("{}: cancelled", item.imdb_id),
        };
        out.push('\n');
        out.push_str(&line);
    }
    out
}

pub async fn add_movie(
    catalog: &dyn CatalogRepository,
    movie: NewMovie,
) -> Result<String> {
    catalog
        .add_movie(&movie)
        .await
        .context("Error adding movie")?;

    Ok(format_movie(&Movie {
        imdb_id: movie.imdb_id,
        title: movie.title,
        year: movie.year,
        rating: movie.rating,
        poster: None,
    }))
}

/// One title per line, in listing order.
pub async fn list_titles(
    catalog: &dyn CatalogRepository,
    query: &ListQuery,
) -> Result<String> {
    let movies = catalog
        .list_movies(query)
        .await
        .context("Error listing movies")?;

    Ok(movies
        .iter()
        .map(|movie| movie.title.as_str())
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn movie_details(
    catalog: &dyn CatalogRepository,
    imdb_id: &ImdbId,
) -> Result<String> {
    match catalog
        .get_movie(imdb_id)
        .await
        .context("Error showing movie details")?
    {
        Some(movie) => Ok(format_movie(&movie)),
        None => bail!("Movie not found: {imdb_id}"),
    }
}

pub async fn delete_movie(
    catalog: &dyn CatalogRepository,
    imdb_id: &ImdbId,
) -> Result<String> {
    if !catalog
        .delete_movie(imdb_id)
        .await
        .context("Error deleting movie")?
    {
        bail!("Movie not found: {imdb_id}");
    }
    Ok("Movie deleted".to_string())
}

pub async fn update_poster(
    catalog: &dyn CatalogRepository,
    imdb_id: &ImdbId,
    poster: &PosterUrl,
) -> Result<String> {
    if !catalog
        .update_poster(imdb_id, poster)
        .await
        .context("Error updating movie poster")?
    {
        bail!("Movie not found: {imdb_id}");
    }
    Ok("Movie poster updated".to_string())
}

pub async fn fetch_posters(
    backfill: &PosterBackfill,
    limit: u32,
    cancel: CancellationToken,
) -> Result<String> {
    let report = backfill
        .run_until_cancelled(limit, cancel)
        .await
        .context("Error fetching posters")?;
    Ok(format_report(&report))
}
