use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::medications::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Missing image data")]
    MissingImage,

    // Detail is logged, never returned to the client
    #[error("Failed to analyze prescription")]
    Processing { detail: String },
}

impl AnalyzeError {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalyzeError::MissingImage => StatusCode::BAD_REQUEST,
            AnalyzeError::Processing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        if let AnalyzeError::Processing { detail } = &self {
            tracing::error!("Error analyzing prescription: {}", detail);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
