//! Metadata sources consulted, in order, when a movie is not cached.

pub mod local_posters;
pub mod omdb;
pub mod streaming_csv;
pub mod tmdb;

use crate::error::Result;
use crate::types::{EnrichmentRecord, SourceData};
use async_trait::async_trait;

pub use local_posters::LocalPosterSource;
pub use omdb::OmdbSource;
pub use streaming_csv::StreamingDataset;
pub use tmdb::TmdbSource;

/// One step of the enrichment fallback chain.
///
/// A lookup that finds nothing returns `PickerError::NotFound`; callers treat
/// that exactly like a transport failure.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Key used for diagnostics on the enrichment record
    fn name(&self) -> &'static str;

    /// Whether this source can still add anything to `record`
    fn is_needed(&self, _record: &EnrichmentRecord) -> bool {
        true
    }

    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData>;
}

#[async_trait]
impl<T: MetadataSource + ?Sized> MetadataSource for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_needed(&self, record: &EnrichmentRecord) -> bool {
        (**self).is_needed(record)
    }

    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData> {
        (**self).lookup(title, year).await
    }
}
