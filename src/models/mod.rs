use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod watch_status;

pub use watch_status::{
    StatusSelection, UpsertOutcome, WatchStatus, WatchStatusKey, WatchStatusRecord,
    WatchStatusUpdate,
};

/// Poster shown by the frontend when a catalog has no artwork
pub const PLACEHOLDER_POSTER_URL: &str = "/placeholder.svg?height=450&width=300";

/// Rating reported when a catalog has none (or reports null)
pub const DEFAULT_RATING: f64 = 0.0;

/// Season number assumed when a catalog omits it
pub const DEFAULT_SEASON_NUMBER: u32 = 1;

/// TMDB serves relative poster paths; this is the w500 rendition prefix
pub const TMDB_POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Kind of content a watch status or catalog lookup refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Show,
    Anime,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Show => "show",
            ContentType::Anime => "anime",
        }
    }

    /// Response key used by the by-status listing, e.g. `movies`, `shows`, `animes`
    pub fn listing_key(&self) -> String {
        format!("{}s", self.as_str())
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "movie" => Ok(ContentType::Movie),
            "show" => Ok(ContentType::Show),
            "anime" => Ok(ContentType::Anime),
            other => Err(AppError::InvalidInput(format!(
                "Invalid contentType '{}': expected movie, show or anime",
                other
            ))),
        }
    }
}

/// One season of a show, as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_number: u32,
    pub episode_count: u32,
    pub name: String,
}

/// Normalized projection of a catalog entry. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: String,
    pub title: String,
    pub poster_url: String,
    pub rating: f64,
    pub year: String,
    pub summary: String,
    pub genres: Vec<String>,
    /// Airing status as reported by the catalog, unrelated to watch status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<Season>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, rename = "season_year", skip_serializing_if = "Option::is_none")]
    pub season_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studios: Option<Vec<String>>,
}

impl ContentSummary {
    /// Summary with every field at its documented default
    pub fn empty(id: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            poster_url: PLACEHOLDER_POSTER_URL.to_string(),
            rating: DEFAULT_RATING,
            year: String::new(),
            summary: String::new(),
            genres: Vec::new(),
            status: None,
            content_type,
            seasons: None,
            episodes: None,
            season: None,
            season_year: None,
            source: None,
            studios: None,
        }
    }
}

/// First four characters of a `YYYY-MM-DD` style date, or `""` when absent
pub fn year_from_date(date: Option<&str>) -> String {
    date.map(|d| d.chars().take(4).collect()).unwrap_or_default()
}

fn poster_or_placeholder(url: Option<String>) -> String {
    url.filter(|u| !u.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_POSTER_URL.to_string())
}

/// Absolute TMDB poster URL for a relative `poster_path`
pub fn tmdb_poster_url(poster_path: Option<&str>) -> String {
    match poster_path {
        Some(path) if !path.is_empty() => format!("{}{}", TMDB_POSTER_BASE_URL, path),
        _ => PLACEHOLDER_POSTER_URL.to_string(),
    }
}

/// Upstream season name, or `Season {n}` when blank
pub fn season_name(season_number: u32, name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Season {}", season_number),
    }
}

/// Treats an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// TMDB API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

/// Movie from GET /movie/{id} or a /search/movie result
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<TmdbMovie> for ContentSummary {
    fn from(movie: TmdbMovie) -> Self {
        ContentSummary {
            title: movie.title.unwrap_or_default(),
            poster_url: tmdb_poster_url(movie.poster_path.as_deref()),
            rating: movie.vote_average.unwrap_or(DEFAULT_RATING),
            year: year_from_date(movie.release_date.as_deref()),
            summary: movie.overview.unwrap_or_default(),
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
            status: movie.status,
            ..ContentSummary::empty(movie.id.to_string(), ContentType::Movie)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<TmdbMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<TmdbSeason> for Season {
    fn from(season: TmdbSeason) -> Self {
        let season_number = season.season_number.unwrap_or(DEFAULT_SEASON_NUMBER);
        Season {
            season_number,
            episode_count: season.episode_count.unwrap_or(0),
            name: season_name(season_number, season.name.as_deref()),
        }
    }
}

/// TV show from GET /tv/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShow {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seasons: Vec<TmdbSeason>,
}

impl TmdbShow {
    pub fn into_seasons(self) -> Vec<Season> {
        self.seasons.into_iter().map(Season::from).collect()
    }
}

impl From<TmdbShow> for ContentSummary {
    fn from(show: TmdbShow) -> Self {
        ContentSummary {
            title: show.name.unwrap_or_default(),
            poster_url: tmdb_poster_url(show.poster_path.as_deref()),
            rating: show.vote_average.unwrap_or(DEFAULT_RATING),
            year: year_from_date(show.first_air_date.as_deref()),
            summary: show.overview.unwrap_or_default(),
            genres: show.genres.into_iter().map(|g| g.name).collect(),
            status: show.status,
            ..ContentSummary::empty(show.id.to_string(), ContentType::Show)
        }
    }
}

// ============================================================================
// TVmaze API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeImage {
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeRating {
    #[serde(default)]
    pub average: Option<f64>,
}

/// Show from GET /shows/{id}, also nested in search results
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeShow {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<TvMazeImage>,
    #[serde(default)]
    pub rating: Option<TvMazeRating>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Element of GET /search/shows
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeSearchResult {
    pub show: TvMazeShow,
}

impl From<TvMazeShow> for ContentSummary {
    fn from(show: TvMazeShow) -> Self {
        ContentSummary {
            title: show.name.unwrap_or_default(),
            poster_url: poster_or_placeholder(show.image.and_then(|i| i.medium)),
            rating: show
                .rating
                .and_then(|r| r.average)
                .unwrap_or(DEFAULT_RATING),
            year: year_from_date(show.premiered.as_deref()),
            summary: show.summary.unwrap_or_default(),
            genres: show.genres,
            status: Some(show.status.unwrap_or_default()),
            ..ContentSummary::empty(show.id.to_string(), ContentType::Show)
        }
    }
}

// ============================================================================
// MyAnimeList API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MalNamed {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalPicture {
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalStartSeason {
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Anime node from GET /anime/{id}, /anime and /anime/ranking
#[derive(Debug, Clone, Deserialize)]
pub struct MalAnime {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub main_picture: Option<MalPicture>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<MalNamed>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub num_episodes: Option<u32>,
    #[serde(default)]
    pub start_season: Option<MalStartSeason>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub studios: Option<Vec<MalNamed>>,
}

impl From<MalAnime> for ContentSummary {
    fn from(anime: MalAnime) -> Self {
        let (season, season_year) = match anime.start_season {
            Some(start) => (start.season, start.year),
            None => (None, None),
        };

        ContentSummary {
            title: anime.title.unwrap_or_default(),
            poster_url: poster_or_placeholder(anime.main_picture.and_then(|p| p.medium)),
            rating: anime.mean.unwrap_or(DEFAULT_RATING),
            year: year_from_date(anime.start_date.as_deref()),
            summary: anime.synopsis.unwrap_or_default(),
            genres: anime.genres.into_iter().map(|g| g.name).collect(),
            status: anime.status,
            episodes: Some(anime.num_episodes.unwrap_or(0)),
            season,
            season_year,
            source: anime.source,
            studios: anime
                .studios
                .map(|studios| studios.into_iter().map(|s| s.name).collect()),
            ..ContentSummary::empty(anime.id.to_string(), ContentType::Anime)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalNode {
    pub node: MalAnime,
}

/// Paged list wrapper used by MAL search and ranking
#[derive(Debug, Clone, Deserialize)]
pub struct MalListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<MalNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date(Some("2021-07-09")), "2021");
        assert_eq!(year_from_date(Some("")), "");
        assert_eq!(year_from_date(None), "");
    }

    #[test]
    fn test_season_name_synthesized_when_blank() {
        assert_eq!(season_name(3, None), "Season 3");
        assert_eq!(season_name(2, Some("  ")), "Season 2");
        assert_eq!(season_name(0, Some("Specials")), "Specials");
    }

    #[test]
    fn test_tmdb_season_defaults() {
        let season: TmdbSeason = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        let season = Season::from(season);
        assert_eq!(season.season_number, DEFAULT_SEASON_NUMBER);
        assert_eq!(season.episode_count, 0);
        assert_eq!(season.name, "Season 1");
    }

    #[test]
    fn test_tmdb_movie_mapping() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "poster_path": "/inception.jpg",
            "vote_average": 8.4,
            "release_date": "2010-07-15",
            "overview": "A thief who steals corporate secrets.",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        let summary = ContentSummary::from(movie);
        assert_eq!(summary.id, "27205");
        assert_eq!(summary.poster_url, "https://image.tmdb.org/t/p/w500/inception.jpg");
        assert_eq!(summary.year, "2010");
        assert_eq!(summary.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(summary.content_type, ContentType::Movie);
        assert!(summary.seasons.is_none());
    }

    #[test]
    fn test_tmdb_movie_missing_fields_use_defaults() {
        let json = r#"{"id": 1, "poster_path": null, "vote_average": null, "release_date": null, "genres": null}"#;

        let summary = ContentSummary::from(serde_json::from_str::<TmdbMovie>(json).unwrap());
        assert_eq!(summary.poster_url, PLACEHOLDER_POSTER_URL);
        assert_eq!(summary.rating, DEFAULT_RATING);
        assert_eq!(summary.year, "");
        assert!(summary.genres.is_empty());
    }

    #[test]
    fn test_tvmaze_show_mapping() {
        let json = r#"{
            "id": 169,
            "name": "Breaking Bad",
            "image": null,
            "rating": {"average": null},
            "premiered": "2008-01-20",
            "summary": "<p>A chemistry teacher.</p>",
            "genres": ["Drama", "Crime"],
            "status": "Ended"
        }"#;

        let summary = ContentSummary::from(serde_json::from_str::<TvMazeShow>(json).unwrap());
        assert_eq!(summary.id, "169");
        assert_eq!(summary.poster_url, PLACEHOLDER_POSTER_URL);
        assert_eq!(summary.rating, 0.0);
        assert_eq!(summary.year, "2008");
        assert_eq!(summary.status.as_deref(), Some("Ended"));
        assert_eq!(summary.content_type, ContentType::Show);
    }

    #[test]
    fn test_mal_anime_mapping() {
        let json = r#"{
            "id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "main_picture": {"medium": "https://cdn.myanimelist.net/images/anime/1223/96541.jpg"},
            "mean": 9.1,
            "start_date": "2009-04-05",
            "genres": [{"id": 1, "name": "Action"}],
            "num_episodes": 64,
            "start_season": {"season": "spring", "year": 2009},
            "studios": [{"id": 4, "name": "Bones"}]
        }"#;

        let summary = ContentSummary::from(serde_json::from_str::<MalAnime>(json).unwrap());
        assert_eq!(summary.episodes, Some(64));
        assert_eq!(summary.year, "2009");
        assert_eq!(summary.season.as_deref(), Some("spring"));
        assert_eq!(summary.season_year, Some(2009));
        assert_eq!(summary.studios, Some(vec!["Bones".to_string()]));
        assert_eq!(summary.summary, "");
    }

    #[test]
    fn test_content_summary_serializes_camel_case() {
        let mut summary = ContentSummary::empty("42", ContentType::Show);
        summary.seasons = Some(vec![Season {
            season_number: 1,
            episode_count: 10,
            name: "Season 1".to_string(),
        }]);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["posterUrl"], PLACEHOLDER_POSTER_URL);
        assert_eq!(value["type"], "show");
        assert_eq!(value["seasons"][0]["seasonNumber"], 1);
        assert_eq!(value["seasons"][0]["episodeCount"], 10);
        assert!(value.get("episodes").is_none());
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("anime".parse::<ContentType>().unwrap(), ContentType::Anime);
        assert!("tv".parse::<ContentType>().is_err());
        assert_eq!(ContentType::Anime.listing_key(), "animes");
    }
}
