use async_trait::async_trait;
use domain::medications::{AnalysisResult, AnalyzeRequest, CapturedImage, ErrorResponse};

use crate::errors::Error;

#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Sends the captured image for analysis. Single attempt, no retries.
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, Error>;
}

/// Posts the image as JSON to the analysis endpoint.
#[derive(Clone, Debug)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, Error> {
        let request = AnalyzeRequest {
            image: Some(image.as_str().to_string()),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Analysis {
                message: format!("request to {} failed: {}", self.endpoint, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the endpoint's own message when the body carries one
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => format!("endpoint returned {}", status),
            };
            return Err(Error::Analysis { message });
        }

        response.json().await.map_err(|e| Error::Analysis {
            message: format!("unreadable analysis response: {}", e),
        })
    }
}
