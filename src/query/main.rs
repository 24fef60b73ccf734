//! Query server for country lookups.
//!
//! Provides an HTTP API answering which country contains a point, backed by
//! a lazily loaded polygon data file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use countrypip::pip::{BoundaryError, DEFAULT_DATA_FILE};
use countrypip::{BoundaryStore, GeoPoint, PointLocator};

mod config;
use config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Country lookup server")]
struct Args {
    /// Listen address [default: 0.0.0.0:3000]
    #[arg(short, long)]
    listen: Option<String>,

    /// Polygon data file (.gz is decompressed) [default: polygons.properties]
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load boundary data before accepting requests
    #[arg(long)]
    preload: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    locator: PointLocator,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let listen = args
        .listen
        .or(config.listen)
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let data_file = args
        .data_file
        .or(config.data_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

    info!("Countrypip Query Server");
    info!("Boundary data: {}", data_file.display());

    let store = Arc::new(BoundaryStore::new(data_file));

    if args.preload || config.preload {
        let fragments = store.data().context("Failed to preload boundary data")?.len();
        info!("Preloaded {} boundary fragments", fragments);
    }

    let state = Arc::new(AppState {
        locator: PointLocator::new(store),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/country", get(country_handler))
        .route("/v1/country/batch", post(batch_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = state.locator.store();

    Json(HealthResponse {
        status: "ok",
        loaded: store.is_loaded(),
        fragments: store.len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    loaded: bool,
    fragments: Option<usize>,
}

/// Single point lookup
async fn country_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountryQueryParams>,
) -> Result<Json<CountryResponse>, (StatusCode, String)> {
    let country = state
        .locator
        .lookup(params.point_lon, params.point_lat)
        .map_err(internal_error)?;

    Ok(Json(CountryResponse {
        country: country.map(str::to_string),
    }))
}

/// Batch lookup, resolved off the async runtime
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, (StatusCode, String)> {
    let countries = tokio::task::spawn_blocking(move || {
        state.locator.lookup_batch(&request.points).map(|found| {
            found
                .into_iter()
                .map(|c| c.map(str::to_string))
                .collect::<Vec<_>>()
        })
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(internal_error)?;

    Ok(Json(BatchResponse { countries }))
}

fn internal_error(e: BoundaryError) -> (StatusCode, String) {
    tracing::error!("Country lookup failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Deserialize)]
struct CountryQueryParams {
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
}

#[derive(Serialize)]
struct CountryResponse {
    country: Option<String>,
}

#[derive(Deserialize)]
struct BatchRequest {
    points: Vec<GeoPoint>,
}

#[derive(Serialize)]
struct BatchResponse {
    countries: Vec<Option<String>>,
}
