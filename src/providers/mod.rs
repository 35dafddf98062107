//! Streaming-provider normalization and reconciliation

pub mod family;
pub mod reconcile;

pub use family::{family_of, priority_of};
pub use reconcile::{merge, parse_provider_list, reconcile};
