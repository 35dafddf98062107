use crate::constants::{OMDB_API_BASE, OMDB_SOURCE};
use crate::error::{PickerError, Result};
use crate::ingest::parse_runtime_minutes;
use crate::sources::MetadataSource;
use crate::types::{EnrichmentRecord, SourceData};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: Option<String>,
    poster: Option<String>,
    plot: Option<String>,
    rated: Option<String>,
    genre: Option<String>,
    runtime: Option<String>,
    error: Option<String>,
}

/// OMDb title lookup, used as a poster and plot fallback
pub struct OmdbSource {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OmdbSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: OMDB_API_BASE.to_string(),
        })
    }
}

/// OMDb uses "N/A" for absent values
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != "N/A"
    })
}

fn response_data(response: OmdbResponse) -> Result<SourceData> {
    if response.response.as_deref() != Some("True") {
        return Err(PickerError::NotFound(
            response.error.unwrap_or_else(|| "Not found".to_string()),
        ));
    }
    Ok(SourceData {
        poster: present(response.poster),
        plot: present(response.plot),
        rated: present(response.rated),
        genre: present(response.genre),
        runtime_min: present(response.runtime).and_then(|r| parse_runtime_minutes(&r)),
        ..Default::default()
    })
}

#[async_trait]
impl MetadataSource for OmdbSource {
    fn name(&self) -> &'static str {
        OMDB_SOURCE
    }

    fn is_needed(&self, record: &EnrichmentRecord) -> bool {
        record.poster.is_none() || record.plot.is_empty()
    }

    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PickerError::Config("OMDB_API_KEY is not set".to_string()))?;

        let mut query = vec![("t", title.to_string()), ("apikey", api_key.to_string())];
        if let Some(y) = year {
            query.push(("y", y.to_string()));
        }
        let response = self.client.get(&self.base_url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(PickerError::Api {
                message: format!("OMDb returned status {}", response.status()),
            });
        }
        response_data(response.json().await?)
    }
}
