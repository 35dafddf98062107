//! Movie list ingest from the critic/audience CSV export.

use crate::error::Result;
use crate::types::{normalize_year, Movie};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const TITLE_COLUMNS: &[&str] = &["title", "movie_title", "Title"];
const YEAR_COLUMNS: &[&str] = &[
    "release_year",
    "year",
    "Year",
    "release_date",
    "original_release_date",
];
const RATING_COLUMNS: &[&str] = &["content_rating", "rating", "Rating", "rated"];
const GENRE_COLUMNS: &[&str] = &["genres", "genre", "Genre"];
const DIRECTOR_COLUMNS: &[&str] = &["directors", "director"];
const RUNTIME_COLUMNS: &[&str] = &["runtime", "runtime_min", "RuntimeMin"];
const CRITIC_COLUMNS: &[&str] = &["tomatometer_rating", "critic_score"];
const AUDIENCE_COLUMNS: &[&str] = &["audience_rating", "audience_score"];

static HOURS_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?").expect("valid runtime regex"));
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digits regex"));

/// Parse "123", "123 min" or "2h 5m" into minutes
pub fn parse_runtime_minutes(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() || lower == "n/a" {
        return None;
    }
    if let Some(caps) = HOURS_MINUTES_RE.captures(&lower) {
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };
        let total = part(1).checked_mul(60).and_then(|m| m.checked_add(part(2)))?;
        if total > 0 {
            return Some(total);
        }
    }
    DIGITS_RE
        .find(&lower)
        .and_then(|m| m.as_str().parse().ok())
}

struct ColumnMap {
    title: usize,
    year: Option<usize>,
    rating: Option<usize>,
    genre: Option<usize>,
    directors: Option<usize>,
    runtime: Option<usize>,
    critic: Option<usize>,
    audience: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Option<Self> {
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|h| h.trim() == *alias))
        };
        Some(Self {
            title: find(TITLE_COLUMNS)?,
            year: find(YEAR_COLUMNS),
            rating: find(RATING_COLUMNS),
            genre: find(GENRE_COLUMNS),
            directors: find(DIRECTOR_COLUMNS),
            runtime: find(RUNTIME_COLUMNS),
            critic: find(CRITIC_COLUMNS),
            audience: find(AUDIENCE_COLUMNS),
        })
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> &'a str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Read movies from any CSV reader. Rows without a title or that fail to
/// parse are skipped; row ids are assigned densely in file order.
pub fn read_movies<R: Read>(reader: R) -> Result<Vec<Movie>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let Some(columns) = ColumnMap::from_headers(&headers) else {
        warn!("Movie CSV has no title column; nothing to load");
        return Ok(Vec::new());
    };

    let mut movies = Vec::new();
    for (line, row) in csv_reader.records().enumerate() {
        let record = match row {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed CSV row {}: {}", line + 2, e);
                continue;
            }
        };
        let title = field(&record, Some(columns.title));
        if title.is_empty() {
            debug!("Skipping CSV row {} without a title", line + 2);
            continue;
        }
        movies.push(Movie {
            id: movies.len(),
            title: title.to_string(),
            year: normalize_year(field(&record, columns.year)).parse().ok(),
            rating: field(&record, columns.rating).to_string(),
            genre: field(&record, columns.genre).to_string(),
            directors: field(&record, columns.directors).to_string(),
            runtime_min: parse_runtime_minutes(field(&record, columns.runtime)),
            critic_score: field(&record, columns.critic).parse().ok(),
            audience_score: field(&record, columns.audience).parse().ok(),
        });
    }
    Ok(movies)
}

/// Load the movie list from `path`; a missing file yields an empty list.
pub fn load_movies(path: &Path) -> Result<Vec<Movie>> {
    if !path.exists() {
        warn!("Movie CSV {} not found; starting with an empty list", path.display());
        return Ok(Vec::new());
    }
    let movies = read_movies(std::fs::File::open(path)?)?;
    info!("Loaded {} movies from {}", movies.len(), path.display());
    Ok(movies)
}
