use crate::error::PickerError;
use crate::filters::FilterSelection;
use crate::metrics;
use crate::roulette::Roulette;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};

type AppState = Arc<Roulette>;

struct ApiError(PickerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PickerError::EmptyCandidates => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct DetailsParams {
    title: String,
    year: Option<String>,
}

/// Health check endpoint
async fn health(State(app): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "movie-roulette",
        "version": env!("CARGO_PKG_VERSION"),
        "movies": app.movies().len(),
    }))
}

async fn overview(
    State(app): State<AppState>,
    Query(selection): Query<FilterSelection>,
) -> impl IntoResponse {
    Json(app.overview(&selection))
}

async fn random_pick(
    State(app): State<AppState>,
    selection: Option<Json<FilterSelection>>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = selection.map(|Json(s)| s).unwrap_or_default();
    let pick = app.pick(&selection).await.map_err(ApiError)?;
    Ok(Json(pick))
}

async fn details(
    State(app): State<AppState>,
    Query(params): Query<DetailsParams>,
) -> impl IntoResponse {
    let year = params
        .year
        .as_deref()
        .map(crate::types::normalize_year)
        .and_then(|y| y.parse().ok());
    Json(app.enricher().get_details(&params.title, year).await)
}

async fn render_metrics() -> impl IntoResponse {
    metrics::render()
}

/// Create the HTTP router with the JSON API and the static file service
pub fn create_server(app: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000"),
        ))
        .service(ServeDir::new(static_dir));

    Router::new()
        .route("/health", get(health))
        .route("/api/movies", get(overview))
        .route("/api/random", post(random_pick))
        .route("/api/details", get(details))
        .route("/metrics", get(render_metrics))
        .nest_service("/static", static_files)
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(app)
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    app: AppState,
    static_dir: &Path,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_server(app, static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{}", port);
    Server::bind(&addr).serve(router.into_make_service()).await?;
    Ok(())
}
