use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use moviedex_core::{
    CatalogError,
    types::{ImdbId, ListQuery, Movie, NewMovie, PosterUrl},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    AppState,
    infra::errors::{AppError, AppResult},
};

const MISSING_FIELDS: &str = "Missing required fields: IMDb ID, Title, Year, or Rating";

/// Body of `POST /movies`. Every field is optional here so that an omitted
/// field is reported as a bad request instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct NewMovieRequest {
    #[serde(rename = "IMDb_id", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<i32>,
    #[serde(rename = "Rating", default)]
    pub rating: Option<f64>,
}

impl NewMovieRequest {
    fn into_new_movie(self) -> AppResult<NewMovie> {
        let (Some(imdb_id), Some(title), Some(year), Some(rating)) =
            (self.imdb_id, self.title, self.year, self.rating)
        else {
            return Err(AppError::bad_request(MISSING_FIELDS));
        };
        let imdb_id =
            ImdbId::parse(imdb_id).map_err(|_| AppError::bad_request(MISSING_FIELDS))?;

        let movie = NewMovie {
            imdb_id,
            title,
            year,
            rating,
        };
        movie.validate()?;
        Ok(movie)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PosterUpdateRequest {
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
}

pub async fn create_movie_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewMovieRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected movie payload");
        AppError::bad_request("Invalid input")
    })?;
    let movie = request.into_new_movie()?;

    state.catalog.add_movie(&movie).await?;
    info!(imdb_id = %movie.imdb_id, title = %movie.title, "movie added");

    Ok((
        StatusCode::CREATED,
        Json(Movie {
            imdb_id: movie.imdb_id,
            title: movie.title,
            year: movie.year,
            rating: movie.rating,
            poster: None,
        }),
    ))
}

pub async fn list_movies_handler(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<Vec<Movie>>> {
    let Query(params) = params
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let query = ListQuery::from_parts(
        params.sort.as_deref(),
        params.order.as_deref(),
        params.year,
    );

    let movies = state.catalog.list_movies(&query).await?;
    Ok(Json(movies))
}

pub async fn movie_details_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Movie>> {
    let imdb_id = ImdbId::parse(&raw_id)?;
    match state.catalog.get_movie(&imdb_id).await? {
        Some(movie) => Ok(Json(movie)),
        None => Err(CatalogError::NotFound(imdb_id.to_string()).into()),
    }
}

pub async fn delete_movie_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let imdb_id = ImdbId::parse(&raw_id)?;
    if !state.catalog.delete_movie(&imdb_id).await? {
        return Err(CatalogError::NotFound(imdb_id.to_string()).into());
    }

    info!(imdb_id = %imdb_id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_poster_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<PosterUpdateRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let imdb_id = ImdbId::parse(&raw_id)?;
    let Json(request) =
        payload.map_err(|_| AppError::bad_request("Invalid input"))?;
    let poster = request
        .poster
        .ok_or_else(|| AppError::bad_request("Poster URL is required"))
        .and_then(|raw| PosterUrl::parse(raw).map_err(AppError::from))?;

    if !state.catalog.update_poster(&imdb_id, &poster).await? {
        return Err(CatalogError::NotFound(imdb_id.to_string()).into());
    }

    info!(imdb_id = %imdb_id, poster = %poster, "movie poster updated");
    Ok(StatusCode::NO_CONTENT)
}
