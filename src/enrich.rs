use crate::cache::EnrichmentCache;
use crate::config::Config;
use crate::constants::PLACEHOLDER_POSTER;
use crate::error::Result;
use crate::metrics::SourceMetrics;
use crate::providers::{merge, reconcile};
use crate::sources::{
    LocalPosterSource, MetadataSource, OmdbSource, StreamingDataset, TmdbSource,
};
use crate::types::{EnrichmentRecord, Movie, MovieIdentity, SourceData};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Builds display data for a movie: cache first, then each source in order.
pub struct Enricher {
    cache: Arc<EnrichmentCache>,
    sources: Vec<Box<dyn MetadataSource>>,
    backfill: Arc<StreamingDataset>,
    provider_limit: usize,
    throttle: Duration,
}

impl Enricher {
    pub fn new(
        cache: Arc<EnrichmentCache>,
        sources: Vec<Box<dyn MetadataSource>>,
        backfill: Arc<StreamingDataset>,
        provider_limit: usize,
        throttle: Duration,
    ) -> Self {
        Self {
            cache,
            sources,
            backfill,
            provider_limit,
            throttle,
        }
    }

    /// The standard chain: local posters, TMDb, OMDb, then the streaming
    /// dataset, which also serves as the backfill for cached records.
    pub fn from_config(
        config: &Config,
        cache: Arc<EnrichmentCache>,
        streaming: Arc<StreamingDataset>,
    ) -> Result<Self> {
        let enrichment = &config.enrichment;
        let sources: Vec<Box<dyn MetadataSource>> = vec![
            Box::new(LocalPosterSource::new(&config.paths.static_dir)),
            Box::new(TmdbSource::new(
                config.keys.tmdb.clone(),
                &enrichment.region,
                enrichment.timeout(),
            )?),
            Box::new(OmdbSource::new(config.keys.omdb.clone(), enrichment.timeout())?),
            Box::new(streaming.clone()),
        ];
        Ok(Self::new(
            cache,
            sources,
            streaming,
            enrichment.provider_limit,
            enrichment.throttle(),
        ))
    }

    /// Poster, plot and providers for `title`/`year`, from cache or sources.
    #[instrument(skip(self))]
    pub async fn get_details(&self, title: &str, year: Option<u16>) -> EnrichmentRecord {
        let identity = MovieIdentity::with_year(title, year);
        let mut missed = false;

        let record = self
            .cache
            .get_or_compute(
                &identity,
                || self.backfill.providers_for(&identity),
                || {
                    missed = true;
                    self.compute(title, year)
                },
            )
            .await;

        if missed && !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }
        record
    }

    /// Fill blank rating, genre and runtime on CSV rows from enrichment.
    ///
    /// Each incomplete row costs one `get_details` call, so rows already
    /// cached are free and new ones are throttled like any other miss.
    pub async fn fill_filter_fields(&self, movies: &mut [Movie]) -> usize {
        let total = movies.iter().filter(|m| m.lacks_filter_fields()).count();
        if total == 0 {
            return 0;
        }
        info!("Filling filter fields for {} movies from metadata", total);

        let mut done = 0;
        for movie in movies.iter_mut().filter(|m| m.lacks_filter_fields()) {
            let record = self.get_details(&movie.title, movie.year).await;
            movie.fill_filter_fields(&record);
            done += 1;
            if done % 25 == 0 || done == total {
                info!("Filled {}/{} movies", done, total);
            }
        }
        total
    }

    async fn compute(&self, title: &str, year: Option<u16>) -> EnrichmentRecord {
        let mut record = EnrichmentRecord::default();

        for source in &self.sources {
            if !source.is_needed(&record) {
                debug!("Skipping {}; nothing left for it to add", source.name());
                continue;
            }
            let started = Instant::now();
            match source.lookup(title, year).await {
                Ok(mut data) => {
                    SourceMetrics::record_success(source.name(), started.elapsed().as_secs_f64());
                    record.errors.extend(data.diagnostics.drain(..));
                    self.absorb(&mut record, data);
                }
                Err(e) => {
                    SourceMetrics::record_error(source.name());
                    debug!("{} had nothing for {}: {}", source.name(), title, e);
                    record.errors.insert(source.name().to_string(), e.to_string());
                }
            }
        }

        if record.poster.is_none() {
            record.poster = Some(PLACEHOLDER_POSTER.to_string());
        }
        record.fetched_at = Some(Utc::now());
        info!(
            "Enriched {} with {} providers ({} source errors)",
            title,
            record.providers.len(),
            record.errors.len()
        );
        record
    }

    /// Fold one source's data in: first poster, plot and filter fields win,
    /// providers are merged behind the ones already held and reconciled again.
    fn absorb(&self, record: &mut EnrichmentRecord, data: SourceData) {
        if record.poster.is_none() {
            record.poster = data.poster;
        }
        if record.plot.is_empty() {
            if let Some(plot) = data.plot {
                record.plot = plot;
            }
        }
        if record.rated.is_empty() {
            record.rated = data.rated.unwrap_or_default();
        }
        if record.genre.is_empty() {
            record.genre = data.genre.unwrap_or_default();
        }
        if record.runtime_min.is_none() {
            record.runtime_min = data.runtime_min;
        }
        if !data.providers.is_empty() {
            let merged = merge(&record.providers, &data.providers);
            record.providers = reconcile(&[merged], self.provider_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickerError;
    use crate::types::ProviderEntry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    struct FakeSource {
        name: &'static str,
        result: std::result::Result<SourceData, String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn lookup(&self, _title: &str, _year: Option<u16>) -> Result<SourceData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|message| PickerError::Api { message })
        }
    }

    fn fake(
        name: &'static str,
        result: std::result::Result<SourceData, String>,
    ) -> (Box<dyn MetadataSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource {
            name,
            result,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }

    fn enricher(
        dir: &TempDir,
        sources: Vec<Box<dyn MetadataSource>>,
        backfill: StreamingDataset,
    ) -> Enricher {
        let cache = Arc::new(EnrichmentCache::open(dir.path().join("cache.json"), 5));
        Enricher::new(cache, sources, Arc::new(backfill), 5, Duration::ZERO)
    }

    fn provider(name: &str, logo: Option<&str>) -> ProviderEntry {
        ProviderEntry {
            name: name.to_string(),
            logo: logo.map(str::to_string),
            url: None,
        }
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_the_chain() {
        let dir = tempdir().unwrap();
        let (broken, _) = fake("tmdb", Err("timed out".to_string()));
        let (omdb, omdb_calls) = fake(
            "omdb",
            Ok(SourceData {
                poster: Some("https://omdb/p.jpg".to_string()),
                plot: Some("Fallback plot".to_string()),
                providers: Vec::new(),
                ..Default::default()
            }),
        );
        let enricher = enricher(&dir, vec![broken, omdb], StreamingDataset::default());

        let record = enricher.get_details("Alien", Some(1979)).await;
        assert_eq!(omdb_calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.poster.as_deref(), Some("https://omdb/p.jpg"));
        assert_eq!(record.plot, "Fallback plot");
        assert!(record.errors["tmdb"].contains("timed out"));
        assert!(record.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_placeholder_when_no_poster_found() {
        let dir = tempdir().unwrap();
        let (broken, _) = fake("tmdb", Err("not found".to_string()));
        let enricher = enricher(&dir, vec![broken], StreamingDataset::default());

        let record = enricher.get_details("Unknown Film", None).await;
        assert_eq!(record.poster.as_deref(), Some(PLACEHOLDER_POSTER));
        assert_eq!(record.plot, "");
        assert!(record.providers.is_empty());
    }

    #[tokio::test]
    async fn test_providers_reconciled_across_sources() {
        let dir = tempdir().unwrap();
        let (tmdb, _) = fake(
            "tmdb",
            Ok(SourceData {
                poster: Some("https://tmdb/p.jpg".to_string()),
                plot: Some("Plot".to_string()),
                providers: vec![
                    provider("Amazon Prime Video with Ads", Some("/amazon.png")),
                    provider("Max", Some("/max.png")),
                ],
                ..Default::default()
            }),
        );
        let (csv, _) = fake(
            "streaming_csv",
            Ok(SourceData {
                providers: vec![provider("Amazon Video", None), provider("Netflix", None)],
                ..Default::default()
            }),
        );
        let enricher = enricher(&dir, vec![tmdb, csv], StreamingDataset::default());

        let record = enricher.get_details("Heat", Some(1995)).await;
        let names: Vec<&str> = record.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Netflix", "HBO Max", "Amazon"]);
        assert_eq!(record.providers[2].logo.as_deref(), Some("/amazon.png"));
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache() {
        let dir = tempdir().unwrap();
        let (tmdb, calls) = fake(
            "tmdb",
            Ok(SourceData {
                plot: Some("Plot".to_string()),
                providers: vec![provider("Hulu", None)],
                ..Default::default()
            }),
        );
        let enricher = enricher(&dir, vec![tmdb], StreamingDataset::default());

        let first = enricher.get_details("The Matrix", Some(1999)).await;
        let second = enricher.get_details("  the matrix ", Some(1999)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cached_record_without_providers_is_backfilled() {
        let dir = tempdir().unwrap();
        let (tmdb, calls) = fake(
            "tmdb",
            Ok(SourceData {
                plot: Some("Plot".to_string()),
                ..Default::default()
            }),
        );
        let dataset = StreamingDataset::from_reader(
            "title,year,providers\nStalker,1979,\"Kanopy, Criterion Channel\"\n".as_bytes(),
        )
        .unwrap();
        let enricher = enricher(&dir, vec![tmdb], dataset);

        // First lookup finds no providers from the chain itself
        let stalker = MovieIdentity::new("Stalker", "1979");
        let cached = enricher
            .cache
            .get_or_compute(&stalker, Vec::new, || async { EnrichmentRecord::default() })
            .await;
        assert!(cached.providers.is_empty());

        let record = enricher.get_details("Stalker", Some(1979)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let names: Vec<&str> = record.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Criterion Channel", "Kanopy"]);
    }

    #[tokio::test]
    async fn test_provider_diagnostics_recorded_on_record() {
        let dir = tempdir().unwrap();
        let (tmdb, _) = fake(
            "tmdb",
            Ok(SourceData {
                plot: Some("Plot".to_string()),
                diagnostics: vec![("tmdb_providers".to_string(), "status 500".to_string())],
                ..Default::default()
            }),
        );
        let enricher = enricher(&dir, vec![tmdb], StreamingDataset::default());

        let record = enricher.get_details("Heat", Some(1995)).await;
        assert_eq!(record.plot, "Plot");
        assert_eq!(record.errors["tmdb_providers"], "status 500");
        assert!(!record.errors.contains_key("tmdb"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_only_after_a_miss() {
        let dir = tempdir().unwrap();
        let (tmdb, calls) = fake(
            "tmdb",
            Ok(SourceData {
                plot: Some("Plot".to_string()),
                ..Default::default()
            }),
        );
        let cache = Arc::new(EnrichmentCache::open(dir.path().join("cache.json"), 5));
        let throttle = Duration::from_millis(200);
        let enricher = Enricher::new(
            cache,
            vec![tmdb],
            Arc::new(StreamingDataset::default()),
            5,
            throttle,
        );

        let start = tokio::time::Instant::now();
        enricher.get_details("Heat", Some(1995)).await;
        assert!(start.elapsed() >= throttle);

        let start = tokio::time::Instant::now();
        enricher.get_details("Heat", Some(1995)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_filter_fields_filled_from_sources() {
        let dir = tempdir().unwrap();
        let (tmdb, calls) = fake(
            "tmdb",
            Ok(SourceData {
                rated: Some("PG-13".to_string()),
                genre: Some("Drama".to_string()),
                runtime_min: Some(112),
                ..Default::default()
            }),
        );
        let (omdb, _) = fake(
            "omdb",
            Ok(SourceData {
                rated: Some("R".to_string()),
                genre: Some("Thriller".to_string()),
                ..Default::default()
            }),
        );
        let enricher = enricher(&dir, vec![tmdb, omdb], StreamingDataset::default());

        let mut movies = vec![
            Movie {
                id: 0,
                title: "Blank".to_string(),
                ..Default::default()
            },
            Movie {
                id: 1,
                title: "Complete".to_string(),
                rating: "G".to_string(),
                genre: "Family".to_string(),
                runtime_min: Some(80),
                ..Default::default()
            },
        ];
        assert_eq!(enricher.fill_filter_fields(&mut movies).await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(movies[0].rating, "PG-13");
        assert_eq!(movies[0].genre, "Drama");
        assert_eq!(movies[0].runtime_min, Some(112));
        assert_eq!(movies[1].rating, "G");
        assert_eq!(movies[1].runtime_min, Some(80));
    }
}
