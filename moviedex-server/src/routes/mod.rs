use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    handlers::{
        movies::{
            create_movie_handler, delete_movie_handler, list_movies_handler,
            movie_details_handler, update_poster_handler,
        },
        ping_handler,
        posters::backfill_posters_handler,
    },
};

pub const PING: &str = "/ping";
pub const MOVIES: &str = "/movies";
pub const MOVIE: &str = "/movies/{imdb_id}";
pub const MOVIE_POSTER: &str = "/movies/{imdb_id}/poster";
pub const POSTER_BACKFILL: &str = "/posters/backfill";

/// Fills the `{imdb_id}` placeholder of a movie route.
pub fn movie_path(route: &str, imdb_id: &str) -> String {
    route.replace("{imdb_id}", imdb_id)
}

pub fn create_app(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route(PING, get(ping_handler))
        .route(MOVIES, get(list_movies_handler).post(create_movie_handler))
        .route(
            MOVIE,
            get(movie_details_handler).delete(delete_movie_handler),
        )
        .route(MOVIE_POSTER, put(update_poster_handler))
        .route(POSTER_BACKFILL, post(backfill_posters_handler))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
