//! Candidate filtering by content rating, genre and runtime.

use crate::constants::ANY;
use crate::types::Movie;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeBucket {
    #[default]
    Any,
    Under90,
    From90To120,
    From120To150,
    Over150,
}

impl RuntimeBucket {
    /// Parse a selection label; unknown labels mean no runtime filter.
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "<90" => Self::Under90,
            "90-120" => Self::From90To120,
            "120-150" => Self::From120To150,
            "150+" => Self::Over150,
            _ => Self::Any,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => ANY,
            Self::Under90 => "<90",
            Self::From90To120 => "90-120",
            Self::From120To150 => "120-150",
            Self::Over150 => "150+",
        }
    }

    /// Movies with unknown runtime only match `Any`
    pub fn matches(&self, runtime: Option<u32>) -> bool {
        match (self, runtime) {
            (Self::Any, _) => true,
            (_, None) => false,
            (Self::Under90, Some(m)) => m < 90,
            (Self::From90To120, Some(m)) => (90..=120).contains(&m),
            (Self::From120To150, Some(m)) => (120..=150).contains(&m),
            (Self::Over150, Some(m)) => m >= 150,
        }
    }
}

fn any() -> String {
    ANY.to_string()
}

/// A user's filter choices; every field defaults to "Any".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default = "any")]
    pub rated: String,
    #[serde(default = "any")]
    pub genre: String,
    #[serde(default = "any")]
    pub runtime: String,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            rated: any(),
            genre: any(),
            runtime: any(),
        }
    }
}

fn is_any(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case(ANY)
}

impl FilterSelection {
    pub fn matches(&self, movie: &Movie) -> bool {
        if !is_any(&self.rated) && !movie.rating.trim().eq_ignore_ascii_case(self.rated.trim()) {
            return false;
        }
        if !is_any(&self.genre)
            && !movie
                .genre
                .to_lowercase()
                .contains(&self.genre.trim().to_lowercase())
        {
            return false;
        }
        RuntimeBucket::parse(&self.runtime).matches(movie.runtime_min)
    }

    /// Row ids of the movies passing every filter, in list order
    pub fn candidate_ids(&self, movies: &[Movie]) -> Vec<usize> {
        movies
            .iter()
            .filter(|m| self.matches(m))
            .map(|m| m.id)
            .collect()
    }
}

/// Dropdown values derived from the loaded list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub ratings: Vec<String>,
    pub runtimes: Vec<&'static str>,
}

impl FilterOptions {
    pub fn from_movies(movies: &[Movie]) -> Self {
        let genres: BTreeSet<String> = movies
            .iter()
            .flat_map(|m| m.genre.split(','))
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        let ratings: BTreeSet<String> = movies
            .iter()
            .map(|m| m.rating.trim())
            .filter(|r| !r.is_empty() && *r != "N/A")
            .map(str::to_string)
            .collect();

        Self {
            genres: std::iter::once(any()).chain(genres).collect(),
            ratings: std::iter::once(any()).chain(ratings).collect(),
            runtimes: [
                RuntimeBucket::Any,
                RuntimeBucket::Under90,
                RuntimeBucket::From90To120,
                RuntimeBucket::From120To150,
                RuntimeBucket::Over150,
            ]
            .iter()
            .map(RuntimeBucket::label)
            .collect(),
        }
    }
}
