use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    // Base64 or data URL; `None` when the client omitted it
    #[serde(default)]
    pub image: Option<String>,
}

impl AnalyzeRequest {
    /// The image payload, treating an empty string as absent.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
