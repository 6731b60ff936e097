use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::medications::{AnalysisResult, AnalyzedMedication, CapturedImage};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    ScanStarted {
        id: String,
    },

    ScanCancelled {
        id: String,
    },

    ImageCaptured {
        id: String,
        image: CapturedImage,
    },

    ProgressAdvanced {
        id: String,
        progress: u8,
    },

    AnalysisReceived {
        id: String,
        result: AnalysisResult,
    },

    AnalysisFailed {
        id: String,
        message: String,
    },

    ScanCompleted {
        id: String,
        medications: Vec<AnalyzedMedication>,
    },

    CaptureDiscarded {
        id: String,
    },

    MedicationSelected {
        id: String,
        index: usize,
    },

    DetailClosed {
        id: String,
    },

    ScanReset,
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::ScanStarted { .. } => "Scan:Started".to_string(),
            Event::ScanCancelled { .. } => "Scan:Cancelled".to_string(),
            Event::ImageCaptured { .. } => "Scan:ImageCaptured".to_string(),
            Event::ProgressAdvanced { .. } => "Scan:ProgressAdvanced".to_string(),
            Event::AnalysisReceived { .. } => "Scan:AnalysisReceived".to_string(),
            Event::AnalysisFailed { .. } => "Scan:AnalysisFailed".to_string(),
            Event::ScanCompleted { .. } => "Scan:Completed".to_string(),
            Event::CaptureDiscarded { .. } => "Scan:CaptureDiscarded".to_string(),
            Event::MedicationSelected { .. } => "Scan:MedicationSelected".to_string(),
            Event::DetailClosed { .. } => "Scan:DetailClosed".to_string(),
            Event::ScanReset => "Scan:Reset".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
