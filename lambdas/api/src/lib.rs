//! Mock prescription analysis endpoint

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain::medications::{self, AnalysisResult, AnalyzeRequest};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use ulid::Ulid;

pub mod config;
pub mod errors;

pub use config::ApiConfig;
pub use errors::AnalyzeError;

pub const ANALYZE_PATH: &str = "/api/analyze-prescription";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Clone)]
pub struct AppState {
    analyzer: MockAnalyzer,
}

impl AppState {
    pub fn new(analysis_delay: Duration) -> Self {
        Self {
            analyzer: MockAnalyzer { analysis_delay },
        }
    }
}

/// Stands in for OCR + model inference: waits, then returns the fixed result.
#[derive(Clone, Debug)]
pub struct MockAnalyzer {
    analysis_delay: Duration,
}

impl MockAnalyzer {
    pub async fn analyze(&self, _image: &str) -> Result<AnalysisResult, AnalyzeError> {
        tokio::time::sleep(self.analysis_delay).await;
        Ok(medications::fixed_analysis())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(analyze_prescription))
        .route(HEALTH_PATH, get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Analyze prescription image
//
// The body is parsed regardless of content type; anything that is not a JSON
// object maps to the generic 500.
async fn analyze_prescription(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AnalyzeError> {
    let request_id = Ulid::new().to_string();

    let request: AnalyzeRequest =
        serde_json::from_slice(&body).map_err(|e| AnalyzeError::Processing {
            detail: format!("invalid request body: {}", e),
        })?;

    let image = request.image().ok_or(AnalyzeError::MissingImage)?;

    tracing::info!(
        "Analyzing prescription {} ({} bytes of image data)",
        request_id,
        image.len()
    );

    let result = state.analyzer.analyze(image).await?;

    tracing::info!(
        "Prescription {} analyzed: {} medications",
        request_id,
        result.medications.len()
    );

    Ok(Json(result))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
