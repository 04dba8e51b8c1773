//! HTTP server for the datastream conversion API.
//!
//! Endpoints:
//! - `POST /convert` - Convert one NetCDF container to an Arrow IPC stream
//! - `POST /convert/batch` - Convert several containers into one stream
//! - `GET /health` - Health check

use axum::{
    extract::{Extension, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use bytes::Bytes;
use crosswalk::{convert_nc, convert_nc_batch, to_ipc_stream, CrosswalkSource};
use hydro_common::DataStreamError;

/// Content type of the Arrow IPC stream responses.
pub const ARROW_STREAM_CONTENT_TYPE: &str = "application/vnd.apache.arrow.stream";

/// Shared state for the HTTP server.
pub struct ServerState {
    /// Where to load the crosswalk reference from.
    pub xwalk: CrosswalkSource,
}

/// Request body for /convert.
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    /// Time-series source URL
    #[serde(rename = "ncFile")]
    pub nc_file: String,
    /// Hydrofabric GeoPackage URL
    pub vpu_gpkg: String,
}

/// Request body for /convert/batch.
#[derive(Debug, Deserialize)]
pub struct ConvertBatchRequest {
    /// Time-series source URLs, converted independently
    pub nc_files: Vec<String>,
    /// Hydrofabric GeoPackage URL shared by every file
    pub vpu_gpkg: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// POST /convert - Convert one container
async fn convert_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Json(request): Json<ConvertRequest>,
) -> Response {
    info!(
        nc_file = %request.nc_file,
        vpu_gpkg = %request.vpu_gpkg,
        "Received convert request"
    );

    let result = convert_nc(&request.nc_file, &request.vpu_gpkg, &state.xwalk).await;
    respond_with_stream(result.and_then(|batch| to_ipc_stream(&batch)))
}

/// POST /convert/batch - Convert several containers into one stream
async fn convert_batch_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Json(request): Json<ConvertBatchRequest>,
) -> Response {
    info!(
        files = request.nc_files.len(),
        vpu_gpkg = %request.vpu_gpkg,
        "Received batch convert request"
    );

    let result = convert_nc_batch(&request.nc_files, &request.vpu_gpkg, &state.xwalk).await;
    respond_with_stream(result.and_then(|batch| to_ipc_stream(&batch)))
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "datastream-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn respond_with_stream(result: Result<Bytes, DataStreamError>) -> Response {
    match result {
        Ok(bytes) => {
            info!(size = bytes.len(), "Conversion complete");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, ARROW_STREAM_CONTENT_TYPE)],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Conversion failed");
            let status = StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.to_string()).into_response()
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/convert", post(convert_handler))
        .route("/convert/batch", post(convert_batch_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
