use std::fmt;

use domain::{
    medications::{details_for, AnalyzedMedication, CapturedImage, MedicationDetails},
    scans::{ScanSession, ScanState},
};

const PROCESSING_STEPS: [&str; 3] = [
    "Extracting text with OCR",
    "Identifying medications with AI",
    "Analyzing dosage information",
];

/// What the user is looking at, derived from the session
#[derive(Debug, PartialEq)]
pub enum Screen<'a> {
    Welcome,
    Scanning {
        feed_active: bool,
        /// Why the previous capture was sent back, if it was
        error: Option<&'a str>,
    },
    Processing {
        image: Option<&'a CapturedImage>,
        progress: u8,
    },
    Results {
        medications: &'a [AnalyzedMedication],
        summary: ResultsSummary,
    },
    Detail {
        medication: &'a AnalyzedMedication,
        details: &'static MedicationDetails,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => f.write_str("High"),
            ConfidenceLevel::Medium => f.write_str("Medium"),
            ConfidenceLevel::Low => f.write_str("Low"),
        }
    }
}

/// Footer of the results list
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsSummary {
    pub confidence: Option<(ConfidenceLevel, u8)>,
    pub ocr_quality: Option<String>,
}

impl ResultsSummary {
    fn from_session(session: &ScanSession) -> Self {
        let analysis = session.analysis.as_ref();

        let confidence = analysis.and_then(|a| a.top_confidence()).map(|score| {
            let percent = (score * 100.0).round().clamp(0.0, 100.0) as u8;
            (ConfidenceLevel::from_score(score), percent)
        });

        Self {
            confidence,
            ocr_quality: analysis.map(|a| capitalize(&a.ocr_quality)),
        }
    }
}

impl<'a> Screen<'a> {
    pub fn from_session(session: &'a ScanSession, feed_active: bool) -> Self {
        match session.state {
            ScanState::Welcome => Screen::Welcome,
            ScanState::Scanning => Screen::Scanning {
                feed_active,
                error: session.last_error.as_deref(),
            },
            ScanState::Processing => Screen::Processing {
                image: session.captured_image.as_ref(),
                progress: session.progress,
            },
            ScanState::Results => match session.selected_medication() {
                Some(medication) => Screen::Detail {
                    medication,
                    details: details_for(&medication.info.name),
                },
                None => Screen::Results {
                    medications: &session.medications,
                    summary: ResultsSummary::from_session(session),
                },
            },
        }
    }
}

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Welcome => {
                writeln!(f, "Prescription Scanner")?;
                writeln!(f, "Welcome to Prescription Scanner,")?;
                writeln!(
                    f,
                    "Point your camera at a prescription to identify medications"
                )?;
                write!(f, "[GET STARTED]")
            }

            Screen::Scanning { feed_active, error } => {
                if let Some(error) = error {
                    writeln!(f, "! {}", error)?;
                }
                if *feed_active {
                    writeln!(f, "Line your prescription in the dashed area")?;
                } else {
                    writeln!(f, "Waiting for camera...")?;
                }
                write!(f, "[X] [CAPTURE]")
            }

            Screen::Processing { image, progress } => {
                if let Some(image) = image {
                    writeln!(f, "Captured image: {} chars", image.as_str().len())?;
                }
                writeln!(f, "Processing prescription... {}%", progress)?;
                for step in PROCESSING_STEPS {
                    writeln!(f, "• {}", step)?;
                }
                write!(f, "[RETAKE]")
            }

            Screen::Results {
                medications,
                summary,
            } => {
                writeln!(f, "Identified Medications")?;
                for (index, medication) in medications.iter().enumerate() {
                    writeln!(
                        f,
                        "{}. {} - {} • {}",
                        index + 1,
                        medication.info.name,
                        medication.info.dosage,
                        medication.info.frequency
                    )?;
                }
                if let Some((level, percent)) = summary.confidence {
                    writeln!(f, "AI Confidence: {} ({}%)", level, percent)?;
                }
                if let Some(quality) = &summary.ocr_quality {
                    writeln!(f, "OCR Quality: {}", quality)?;
                }
                write!(f, "[Scan Another Prescription]")
            }

            Screen::Detail {
                medication,
                details,
            } => {
                let info = &medication.info;
                writeln!(f, "{} Details", info.name)?;
                writeln!(f, "Medication: {}", info.name)?;
                writeln!(f, "Dosage: {}", info.dosage)?;
                writeln!(f, "Frequency: {}", info.frequency)?;
                writeln!(f, "Duration: {}", info.duration)?;
                writeln!(f, "Description: {}", details.description)?;
                if !details.side_effects.is_empty() {
                    writeln!(f, "Side Effects:")?;
                    for effect in details.side_effects {
                        writeln!(f, "  - {}", effect)?;
                    }
                }
                write!(f, "[Order Medication]")
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
