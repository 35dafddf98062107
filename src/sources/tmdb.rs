use crate::constants::{
    TMDB_API_BASE, TMDB_LOGO_BASE, TMDB_POSTER_BASE, TMDB_PROVIDERS_DIAGNOSTIC, TMDB_SOURCE,
};
use crate::error::{PickerError, Result};
use crate::sources::MetadataSource;
use crate::types::{ProviderEntry, SourceData};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
    overview: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    release_dates: ReleaseDates,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseDates {
    #[serde(default)]
    results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
struct CountryReleases {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    certification: String,
}

#[derive(Debug, Default, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Default, Deserialize)]
struct RegionProviders {
    link: Option<String>,
    #[serde(default)]
    flatrate: Vec<Offer>,
    #[serde(default)]
    rent: Vec<Offer>,
    #[serde(default)]
    buy: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    provider_name: Option<String>,
    logo_path: Option<String>,
}

/// TMDb search, details and watch-provider lookups
pub struct TmdbSource {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    region: String,
}

impl TmdbSource {
    pub fn new(api_key: Option<String>, region: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: TMDB_API_BASE.to_string(),
            region: region.to_string(),
        })
    }

    /// Point the client at another host, e.g. a local stand-in
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| PickerError::Config("TMDB_API_KEY is not set".to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key()?)])
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PickerError::Api {
                message: format!("TMDb {} returned status {}", path, response.status()),
            });
        }
        Ok(response.json().await?)
    }

    async fn search(&self, title: &str, year: Option<u16>) -> Result<u64> {
        let mut query = vec![("query", title.to_string())];
        if let Some(y) = year {
            query.push(("year", y.to_string()));
        }
        let search: SearchResponse = self.get_json("/search/movie", &query).await?;
        search
            .results
            .first()
            .map(|r| r.id)
            .ok_or_else(|| PickerError::NotFound("Not found".to_string()))
    }
}

/// Flatten one region's offers (subscription, then rent, then buy) into
/// provider entries that share the region's deep link.
fn region_entries(providers: &WatchProvidersResponse, region: &str) -> Vec<ProviderEntry> {
    let Some(offers) = providers.results.get(region) else {
        return Vec::new();
    };
    offers
        .flatrate
        .iter()
        .chain(&offers.rent)
        .chain(&offers.buy)
        .filter_map(|offer| {
            let name = offer.provider_name.as_deref()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(ProviderEntry {
                name: name.to_string(),
                logo: offer
                    .logo_path
                    .as_ref()
                    .map(|p| format!("{}{}", TMDB_LOGO_BASE, p)),
                url: offers.link.clone(),
            })
        })
        .collect()
}

/// First non-empty certification among the region's releases
fn certification(details: &MovieDetails, region: &str) -> Option<String> {
    details
        .release_dates
        .results
        .iter()
        .filter(|entry| entry.iso_3166_1 == region)
        .flat_map(|entry| &entry.release_dates)
        .map(|release| release.certification.trim())
        .find(|cert| !cert.is_empty())
        .map(str::to_string)
}

fn details_data(details: MovieDetails, region: &str) -> SourceData {
    let rated = certification(&details, region);
    let genre = details
        .genres
        .iter()
        .map(|g| g.name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    SourceData {
        poster: details
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", TMDB_POSTER_BASE, p)),
        plot: details.overview.filter(|o| !o.trim().is_empty()),
        rated,
        genre: Some(genre).filter(|g| !g.is_empty()),
        runtime_min: details.runtime.filter(|&m| m > 0),
        ..Default::default()
    }
}

#[async_trait]
impl MetadataSource for TmdbSource {
    fn name(&self) -> &'static str {
        TMDB_SOURCE
    }

    #[instrument(skip(self), fields(source = TMDB_SOURCE))]
    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData> {
        let movie_id = self.search(title, year).await?;
        debug!("TMDb id {} for {}", movie_id, title);

        let details: MovieDetails = self
            .get_json(
                &format!("/movie/{}", movie_id),
                &[("append_to_response", "release_dates".to_string())],
            )
            .await?;
        let mut data = details_data(details, &self.region);

        // Provider lookup failing still leaves poster and plot usable
        match self
            .get_json::<WatchProvidersResponse>(&format!("/movie/{}/watch/providers", movie_id), &[])
            .await
        {
            Ok(providers) => data.providers = region_entries(&providers, &self.region),
            Err(e) => {
                warn!("TMDb watch providers failed for {}: {}", title, e);
                data.diagnostics
                    .push((TMDB_PROVIDERS_DIAGNOSTIC.to_string(), e.to_string()));
            }
        }
        Ok(data)
    }
}
