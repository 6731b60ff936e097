use base64::{engine::general_purpose::STANDARD, Engine as _};
use derive_new::new;
use serde::{Deserialize, Serialize};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A medication as read off a prescription
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct MedicationInfo {
    #[new(into)]
    pub name: String,
    #[new(into)]
    pub dosage: String,
    #[new(into)]
    pub frequency: String,
    #[new(into)]
    pub duration: String,
}

/// Medication plus the analyzer's confidence in the reading (0.0 - 1.0)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, new)]
pub struct AnalyzedMedication {
    #[serde(flatten)]
    pub info: MedicationInfo,
    pub confidence: f64,
}

/// Response body of the analysis endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, new)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub medications: Vec<AnalyzedMedication>,
    #[new(into)]
    pub ocr_quality: String,
    pub processing_time_ms: u64,
}

impl AnalysisResult {
    /// Highest confidence across all medications, if any were found.
    pub fn top_confidence(&self) -> Option<f64> {
        self.medications
            .iter()
            .map(|m| m.confidence)
            .fold(None, |best, c| match best {
                Some(b) if b >= c => Some(b),
                _ => Some(c),
            })
    }
}

/// Still frame encoded as a data URL
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct CapturedImage(String);

impl CapturedImage {
    pub fn from_png(bytes: &[u8]) -> Self {
        Self(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for CapturedImage {
    fn from(encoded: String) -> Self {
        Self(encoded)
    }
}
