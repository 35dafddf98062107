use crate::cache::EnrichmentCache;
use crate::config::Config;
use crate::enrich::Enricher;
use crate::error::{PickerError, Result};
use crate::filters::{FilterOptions, FilterSelection};
use crate::ingest::load_movies;
use crate::shuffle_bag::ShuffleBag;
use crate::sources::StreamingDataset;
use crate::types::{EnrichmentRecord, Movie};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A drawn movie together with its enrichment
#[derive(Debug, Clone, Serialize)]
pub struct Pick {
    pub count: usize,
    pub movie: Movie,
    pub details: EnrichmentRecord,
}

/// Filter counts and dropdown values for the current selection
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total: usize,
    pub count: usize,
    #[serde(flatten)]
    pub options: FilterOptions,
}

/// The loaded movie list plus the stores and enricher every request uses.
/// Built once at startup and shared behind an `Arc`.
pub struct Roulette {
    movies: Vec<Movie>,
    options: FilterOptions,
    bag: ShuffleBag,
    enricher: Enricher,
}

impl Roulette {
    pub fn new(movies: Vec<Movie>, bag: ShuffleBag, enricher: Enricher) -> Self {
        let options = FilterOptions::from_movies(&movies);
        Self {
            movies,
            options,
            bag,
            enricher,
        }
    }

    /// Load everything `config` points at. Rows missing rating, genre or
    /// runtime are completed from metadata first, so filters see them.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut movies = load_movies(&config.paths.movies_csv)?;
        let cache = Arc::new(EnrichmentCache::open(
            &config.paths.cache_file,
            config.enrichment.provider_limit,
        ));
        let streaming = Arc::new(StreamingDataset::load(&config.paths.streaming_csv));
        let enricher = Enricher::from_config(config, cache, streaming)?;
        if config.enrichment.fill_missing_fields {
            enricher.fill_filter_fields(&mut movies).await;
        }
        let bag = ShuffleBag::open(&config.paths.bag_file);
        info!("Roulette ready with {} movies", movies.len());
        Ok(Self::new(movies, bag, enricher))
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn overview(&self, selection: &FilterSelection) -> Overview {
        Overview {
            total: self.movies.len(),
            count: selection.candidate_ids(&self.movies).len(),
            options: self.options.clone(),
        }
    }

    /// Draw a movie matching `selection` from the shuffle bag and enrich it.
    ///
    /// Returns `EmptyCandidates` when nothing matches.
    pub async fn pick(&self, selection: &FilterSelection) -> Result<Pick> {
        let candidates = selection.candidate_ids(&self.movies);
        if candidates.is_empty() {
            return Err(PickerError::EmptyCandidates);
        }
        let id = self.bag.draw(&candidates)?;
        let movie = self
            .movies
            .get(id)
            .cloned()
            .ok_or(PickerError::EmptyCandidates)?;
        info!("Picked {} ({} candidates)", movie.title, candidates.len());

        let details = self.enricher.get_details(&movie.title, movie.year).await;
        Ok(Pick {
            count: candidates.len(),
            movie,
            details,
        })
    }
}
