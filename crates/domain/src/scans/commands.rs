use serde::{Deserialize, Serialize};

use crate::medications::{AnalysisResult, CapturedImage};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Leave the welcome screen and open the camera
    StartScan {
        id: String,
    },

    /// Close the camera without capturing
    CancelScan,

    /// Still frame taken from the camera feed
    CaptureImage {
        image: CapturedImage,
    },

    /// One tick of the progress simulation
    AdvanceProgress,

    /// Analysis response arrived for the captured image
    RecordAnalysis {
        result: AnalysisResult,
    },

    /// Analysis call failed
    FailAnalysis {
        message: String,
    },

    /// Discard the captured image and go back to the camera
    RetakePicture,

    /// Open the detail view for a medication in the results list
    SelectMedication {
        index: usize,
    },

    /// Close the detail view
    CloseDetail,

    /// Drop everything and return to the welcome screen
    Reset,
}
