use thiserror::Error;

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No match: {0}")]
    NotFound(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Cannot draw from an empty candidate set")]
    EmptyCandidates,
}

pub type Result<T> = std::result::Result<T, PickerError>;
