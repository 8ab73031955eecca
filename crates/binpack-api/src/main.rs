use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use binpack_core::{Packer, PackingError, PackingRequest, PackingResult};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting bin packing API");

    let addr = std::env::var("BINPACK_API_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);

    axum::serve(listener, app()).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/solve", post(solve))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "binpack-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds and solves the packing model for one request
async fn solve(Json(request): Json<PackingRequest>) -> Result<Json<PackingResult>, AppError> {
    info!(
        items = request.items.len(),
        bin_types = request.bin_types.len(),
        backend = %request.solver.backend,
        "Received packing request"
    );

    // Branch and bound blocks for up to the time limit
    let result = tokio::task::spawn_blocking(move || Packer::new(request)?.pack())
        .await
        .map_err(|err| AppError::Internal(err.into()))??;

    info!(
        bins = result.bins.len(),
        total_cost = result.total_cost,
        status = %result.status,
        "Packing complete"
    );

    Ok(Json(result))
}

/// Application error type
enum AppError {
    Packing(PackingError),
    Internal(anyhow::Error),
}

impl From<PackingError> for AppError {
    fn from(err: PackingError) -> Self {
        AppError::Packing(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Packing(PackingError::InvalidInput(_))
            | AppError::Packing(PackingError::Infeasible) => StatusCode::BAD_REQUEST,
            AppError::Packing(PackingError::TimeLimitExceeded) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Packing(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Packing(err) => err.to_string(),
            AppError::Internal(err) => err.to_string(),
        };
        error!(status = status.as_u16(), "Request error: {}", message);

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}
