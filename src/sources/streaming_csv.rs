use crate::constants::STREAMING_CSV_SOURCE;
use crate::error::{PickerError, Result};
use crate::providers::parse_provider_list;
use crate::sources::MetadataSource;
use crate::types::{normalize_title, normalize_year, MovieIdentity, ProviderEntry, SourceData};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Precomputed `title,year,providers` coverage table, keyed by normalized
/// title. Rows with no providers are not kept.
#[derive(Debug, Default)]
pub struct StreamingDataset {
    by_title: HashMap<String, Vec<(String, Vec<ProviderEntry>)>>,
}

impl StreamingDataset {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let (Some(title_col), Some(providers_col)) = (position("title"), position("providers")) else {
            return Err(PickerError::Config(
                "streaming dataset needs title and providers columns".to_string(),
            ));
        };
        let year_col = position("year");

        let mut dataset = Self::default();
        for record in csv_reader.records().flatten() {
            let title = normalize_title(record.get(title_col).unwrap_or(""));
            let providers = parse_provider_list(record.get(providers_col).unwrap_or(""));
            if title.is_empty() || providers.is_empty() {
                continue;
            }
            let year = normalize_year(year_col.and_then(|i| record.get(i)).unwrap_or(""));
            dataset.by_title.entry(title).or_default().push((year, providers));
        }
        Ok(dataset)
    }

    /// Load the dataset at `path`. A missing or unreadable file yields an
    /// empty dataset.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No streaming dataset at {}", path.display());
            return Self::default();
        }
        let loaded = std::fs::File::open(path)
            .map_err(PickerError::from)
            .and_then(Self::from_reader);
        match loaded {
            Ok(dataset) => {
                info!("Loaded streaming data for {} titles from {}", dataset.len(), path.display());
                dataset
            }
            Err(e) => {
                warn!("Failed to load streaming dataset {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// Providers for `identity`: exact year first, then a year off by one,
    /// then any year.
    pub fn providers_for(&self, identity: &MovieIdentity) -> Vec<ProviderEntry> {
        let Some(rows) = self.by_title.get(&identity.title) else {
            return Vec::new();
        };

        let exact = rows.iter().find(|(year, _)| *year == identity.year);
        let near = || {
            let wanted = identity.year_number()?;
            rows.iter().find(|(year, _)| {
                year.parse::<u16>()
                    .map(|y| y.abs_diff(wanted) == 1)
                    .unwrap_or(false)
            })
        };

        exact
            .or_else(near)
            .or_else(|| rows.first())
            .map(|(_, providers)| providers.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataSource for StreamingDataset {
    fn name(&self) -> &'static str {
        STREAMING_CSV_SOURCE
    }

    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData> {
        let providers = self.providers_for(&MovieIdentity::with_year(title, year));
        if providers.is_empty() {
            return Err(PickerError::NotFound("no streaming data".to_string()));
        }
        Ok(SourceData {
            providers,
            ..Default::default()
        })
    }
}
