/// Medication and analysis records
pub mod records;

/// Request/response DTOs for the analysis endpoint
pub mod inputs;

/// Fixed analysis output and medication details
pub mod catalog;

pub use catalog::{details_for, fixed_analysis, MedicationDetails};
pub use inputs::{AnalyzeRequest, ErrorResponse};
pub use records::{AnalysisResult, AnalyzedMedication, CapturedImage, MedicationInfo};
