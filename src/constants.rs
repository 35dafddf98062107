/// Shared constants for enrichment, persistence and the HTTP surface.

/// Poster reference used when no source produced one
pub const PLACEHOLDER_POSTER: &str = "/static/placeholder.png";

/// Maximum number of provider entries shown for one movie
pub const DEFAULT_PROVIDER_LIMIT: usize = 5;

/// Sort priority for provider families missing from the priority table
pub const UNMAPPED_PRIORITY: u32 = 999;

/// Pause after a cache-miss lookup, in milliseconds
pub const DEFAULT_THROTTLE_MS: u64 = 200;

/// Per-call timeout for external metadata requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Watch-provider region queried on TMDb
pub const DEFAULT_REGION: &str = "US";

/// Selection value meaning "no filter"
pub const ANY: &str = "Any";

// Source names, used as diagnostic keys on enrichment records
pub const LOCAL_POSTERS_SOURCE: &str = "local_posters";
pub const TMDB_SOURCE: &str = "tmdb";
pub const TMDB_PROVIDERS_DIAGNOSTIC: &str = "tmdb_providers";
pub const OMDB_SOURCE: &str = "omdb";
pub const STREAMING_CSV_SOURCE: &str = "streaming_csv";

// Remote endpoints
pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
pub const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const TMDB_LOGO_BASE: &str = "https://image.tmdb.org/t/p/w92";
pub const OMDB_API_BASE: &str = "https://www.omdbapi.com/";
