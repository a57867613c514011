pub mod omdb;

pub use omdb::{
    LookupError, LookupOutcome, OMDB_DEFAULT_BASE_URL, OmdbProvider, OmdbSettings, PosterLookup,
    classify_poster,
};
