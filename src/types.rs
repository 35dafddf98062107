use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").expect("valid year regex"));

/// Collapse whitespace runs to single spaces, trim, and lowercase.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First run of four digits in `raw`, or an empty string.
pub fn normalize_year(raw: &str) -> String {
    YEAR_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Normalized (title, year) pair used as the cache key and the join key
/// against the streaming dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovieIdentity {
    pub title: String,
    pub year: String,
}

impl MovieIdentity {
    pub fn new(title: &str, year: &str) -> Self {
        Self {
            title: normalize_title(title),
            year: normalize_year(year),
        }
    }

    pub fn with_year(title: &str, year: Option<u16>) -> Self {
        match year {
            Some(y) => Self::new(title, &y.to_string()),
            None => Self::new(title, ""),
        }
    }

    /// Year as a number, when known
    pub fn year_number(&self) -> Option<u16> {
        self.year.parse().ok()
    }

    /// String-encoded key for the persisted cache
    pub fn key(&self) -> String {
        format!("{}|||{}", self.title, self.year)
    }
}

impl fmt::Display for MovieIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} ({})", self.title, self.year)
        }
    }
}

/// One streaming offer for one movie from one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProviderEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logo: None,
            url: None,
        }
    }
}

/// Display data for a movie: poster, plot and reconciled providers.
///
/// `errors` holds one diagnostic message per source that failed or had no
/// match while the record was built; it is never shown to end users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rated: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_min: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

/// What a single metadata source contributed to a lookup.
///
/// `diagnostics` carries failures of secondary calls that did not stop the
/// lookup itself, keyed like `EnrichmentRecord::errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub providers: Vec<ProviderEntry>,
    pub rated: Option<String>,
    pub genre: Option<String>,
    pub runtime_min: Option<u32>,
    pub diagnostics: Vec<(String, String)>,
}

impl SourceData {
    pub fn is_empty(&self) -> bool {
        self.poster.is_none()
            && self.plot.is_none()
            && self.providers.is_empty()
            && self.rated.is_none()
            && self.genre.is_none()
            && self.runtime_min.is_none()
    }
}

/// A movie row from the ingest CSV. Only `title` and `year` feed the
/// identity; the rest is passed through for display and filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: usize,
    pub title: String,
    pub year: Option<u16>,
    pub rating: String,
    pub genre: String,
    pub directors: String,
    pub runtime_min: Option<u32>,
    pub critic_score: Option<f64>,
    pub audience_score: Option<f64>,
}

impl Movie {
    pub fn identity(&self) -> MovieIdentity {
        MovieIdentity::with_year(&self.title, self.year)
    }

    /// Whether any filter field is blank in the CSV row
    pub fn lacks_filter_fields(&self) -> bool {
        self.rating.trim().is_empty() || self.genre.trim().is_empty() || self.runtime_min.is_none()
    }

    /// Fill blank filter fields from enrichment; values already present win.
    pub fn fill_filter_fields(&mut self, record: &EnrichmentRecord) {
        if self.rating.trim().is_empty() && !record.rated.is_empty() {
            self.rating = record.rated.clone();
        }
        if self.genre.trim().is_empty() && !record.genre.is_empty() {
            self.genre = record.genre.clone();
        }
        if self.runtime_min.is_none() {
            self.runtime_min = record.runtime_min;
        }
    }
}
