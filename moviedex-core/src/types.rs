use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Externally assigned catalog identifier (an IMDb title id such as
/// `tt0111161`).
///
/// Surrounding whitespace is stripped from input; an empty identifier is
/// rejected. Identifiers read back from storage keep their stored form so
/// later writes match the same row.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ImdbId(String);

impl ImdbId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CatalogError::Validation(
                "IMDb ID must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps an identifier exactly as stored. Only blank values are refused.
    pub(crate) fn from_stored(raw: String) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(CatalogError::Validation(
                "stored IMDb ID is blank".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImdbId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImdbId {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ImdbId> for String {
    fn from(value: ImdbId) -> Self {
        value.0
    }
}

/// A poster reference that is known to be non-empty.
///
/// The stored value is kept verbatim; only blank input is refused, so the
/// "set but empty" state can never reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PosterUrl(String);

impl PosterUrl {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CatalogError::Validation(
                "poster URL must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PosterUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PosterUrl {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PosterUrl {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PosterUrl> for String {
    fn from(value: PosterUrl) -> Self {
        value.0
    }
}

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "IMDb_id")]
    pub imdb_id: ImdbId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Poster")]
    pub poster: Option<PosterUrl>,
}

/// Insert payload for a catalog record. New records never carry a poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    #[serde(rename = "IMDb_id")]
    pub imdb_id: ImdbId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rating")]
    pub rating: f64,
}

impl NewMovie {
    /// Rejects blank titles and zero year/rating, which the catalog treats as
    /// missing values.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.year == 0 || self.rating == 0.0
        {
            return Err(CatalogError::Validation(
                "Missing required fields: IMDb ID, Title, Year, or Rating"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Year,
    Rating,
}

impl SortKey {
    /// Unknown keys yield `None` and leave the listing unsorted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "year" => Some(Self::Year),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Rating => "Rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Listing options for the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    pub year: Option<i32>,
}

impl ListQuery {
    /// Builds a query from loosely typed inputs. Empty strings and a zero
    /// year mean "not specified".
    pub fn from_parts(
        sort: Option<&str>,
        order: Option<&str>,
        year: Option<i32>,
    ) -> Self {
        Self {
            sort: sort.and_then(SortKey::parse),
            order: order.map(SortOrder::parse).unwrap_or_default(),
            year: year.filter(|y| *y != 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imdb_id_is_trimmed_and_rejects_blank() {
        let id = ImdbId::parse("  tt0111161 \n").unwrap();
        assert_eq!(id.as_str(), "tt0111161");
        assert!(matches!(
            ImdbId::parse("   "),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn stored_imdb_id_keeps_padding() {
        let id = ImdbId::from_stored(" tt0111161".to_string()).unwrap();
        assert_eq!(id.as_str(), " tt0111161");
        assert_ne!(id, ImdbId::parse(" tt0111161").unwrap());
        assert!(ImdbId::from_stored(" \t".to_string()).is_err());
    }

    #[test]
    fn poster_url_keeps_value_verbatim() {
        let url = PosterUrl::parse(" https://img.example/p.jpg").unwrap();
        assert_eq!(url.as_str(), " https://img.example/p.jpg");
        assert!(PosterUrl::parse("").is_err());
        assert!(PosterUrl::parse("  \t").is_err());
    }

    #[test]
    fn movie_uses_catalog_wire_names() {
        let movie = Movie {
            imdb_id: ImdbId::parse("tt0000001").unwrap(),
            title: "Carmencita".to_string(),
            year: 1894,
            rating: 5.7,
            poster: None,
        };

        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["IMDb_id"], "tt0000001");
        assert_eq!(json["Title"], "Carmencita");
        assert_eq!(json["Year"], 1894);
        assert!(json["Poster"].is_null());
    }

    #[test]
    fn blank_poster_is_rejected_on_deserialize() {
        let raw = r#"{"IMDb_id":"tt1","Title":"A","Year":2000,"Rating":7.0,"Poster":""}"#;
        assert!(serde_json::from_str::<Movie>(raw).is_err());
    }

    #[test]
    fn new_movie_requires_all_fields() {
        let mut movie = NewMovie {
            imdb_id: ImdbId::parse("tt0000001").unwrap(),
            title: "Carmencita".to_string(),
            year: 1894,
            rating: 5.7,
        };
        assert!(movie.validate().is_ok());

        movie.rating = 0.0;
        assert!(movie.validate().is_err());

        movie.rating = 5.7;
        movie.title = " ".to_string();
        assert!(movie.validate().is_err());
    }

    #[test]
    fn list_query_ignores_unknown_sort_and_zero_year() {
        let query = ListQuery::from_parts(Some("title"), Some("desc"), Some(0));
        assert_eq!(query.sort, None);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.year, None);

        let query = ListQuery::from_parts(Some("Rating"), Some("sideways"), None);
        assert_eq!(query.sort, Some(SortKey::Rating));
        assert_eq!(query.order, SortOrder::Asc);
    }
}
