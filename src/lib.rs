pub mod cache;
pub mod config;
pub mod constants;
pub mod enrich;
pub mod error;
pub mod filters;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod providers;
pub mod roulette;
pub mod server;
pub mod shuffle_bag;
pub mod sources;
pub mod storage;
pub mod types;

pub use error::{PickerError, Result};
pub use roulette::{Pick, Roulette};
