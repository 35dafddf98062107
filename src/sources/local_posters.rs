use crate::constants::LOCAL_POSTERS_SOURCE;
use crate::error::{PickerError, Result};
use crate::sources::MetadataSource;
use crate::types::{EnrichmentRecord, SourceData};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid filename regex"));

/// File name a downloaded poster is stored under, e.g. `The_Matrix_1999.jpg`
pub fn poster_filename(title: &str, year: Option<u16>) -> String {
    let clean = UNSAFE_CHARS.replace_all(title, "_");
    let year = year.map(|y| y.to_string()).unwrap_or_else(|| "NA".to_string());
    format!("{}_{}.jpg", clean.trim_matches('_'), year)
}

/// Posters previously downloaded into `{static_dir}/posters`
pub struct LocalPosterSource {
    static_dir: PathBuf,
}

impl LocalPosterSource {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }
}

#[async_trait]
impl MetadataSource for LocalPosterSource {
    fn name(&self) -> &'static str {
        LOCAL_POSTERS_SOURCE
    }

    fn is_needed(&self, record: &EnrichmentRecord) -> bool {
        record.poster.is_none()
    }

    async fn lookup(&self, title: &str, year: Option<u16>) -> Result<SourceData> {
        let filename = poster_filename(title, year);
        let path = self.static_dir.join("posters").join(&filename);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(SourceData {
                poster: Some(format!("/static/posters/{}", filename)),
                ..Default::default()
            })
        } else {
            Err(PickerError::NotFound(format!("no local poster {}", filename)))
        }
    }
}
