use std::fmt;

use async_trait::async_trait;
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::medications::{AnalysisResult, AnalyzedMedication, CapturedImage};

use super::{Command, Event};

/// Progress value at which processing is finished
pub const MAX_PROGRESS: u8 = 100;

/// Scan workflow status
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// Landing screen, nothing captured
    #[default]
    Welcome,
    /// Camera open, waiting for capture
    Scanning,
    /// Image captured, analysis running
    Processing,
    /// Medications identified
    Results,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Welcome => "welcome",
            ScanState::Scanning => "scanning",
            ScanState::Processing => "processing",
            ScanState::Results => "results",
        };
        f.write_str(name)
    }
}

/// Scan session aggregate
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanSession {
    pub id: String,
    pub state: ScanState,

    // Processing data
    pub captured_image: Option<CapturedImage>,
    pub progress: u8,
    pub analysis: Option<AnalysisResult>,

    // Results data
    pub medications: Vec<AnalyzedMedication>,
    pub selected: Option<usize>,
    pub detail_open: bool,

    pub last_error: Option<String>,
}

pub const AGGREGATE_TYPE: &str = "ScanSession";

#[derive(Clone, Debug)]
pub struct Services {
    /// Progress added per simulation tick
    pub progress_step: u8,
}

impl Default for Services {
    fn default() -> Self {
        Self { progress_step: 5 }
    }
}

#[async_trait]
impl Aggregate for ScanSession {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::StartScan { id } => {
                self.ensure_state(ScanState::Welcome, ScanState::Scanning)?;
                if id.is_empty() {
                    return Err(Error::Validation {
                        message: "Scan id must not be empty".to_string(),
                    });
                }

                Ok(vec![Event::ScanStarted { id }])
            }

            Command::CancelScan => {
                self.ensure_state(ScanState::Scanning, ScanState::Welcome)?;

                Ok(vec![Event::ScanCancelled { id: self.id.clone() }])
            }

            Command::CaptureImage { image } => {
                self.ensure_state(ScanState::Scanning, ScanState::Processing)?;

                Ok(vec![Event::ImageCaptured {
                    id: self.id.clone(),
                    image,
                }])
            }

            Command::AdvanceProgress => {
                self.ensure_state(ScanState::Processing, ScanState::Processing)?;
                self.next_progress_events(services)
            }

            Command::RecordAnalysis { result } => {
                self.ensure_state(ScanState::Processing, ScanState::Processing)?;
                if self.analysis.is_some() {
                    return Err(Error::Validation {
                        message: "Analysis already recorded for this capture".to_string(),
                    });
                }

                Ok(vec![Event::AnalysisReceived {
                    id: self.id.clone(),
                    result,
                }])
            }

            Command::FailAnalysis { message } => {
                self.ensure_state(ScanState::Processing, ScanState::Scanning)?;

                Ok(vec![Event::AnalysisFailed {
                    id: self.id.clone(),
                    message,
                }])
            }

            Command::RetakePicture => {
                self.ensure_state(ScanState::Processing, ScanState::Scanning)?;

                Ok(vec![Event::CaptureDiscarded { id: self.id.clone() }])
            }

            Command::SelectMedication { index } => {
                self.ensure_state(ScanState::Results, ScanState::Results)?;
                if index >= self.medications.len() {
                    return Err(Error::NotFound {
                        entity: format!("medication #{}", index),
                    });
                }

                Ok(vec![Event::MedicationSelected {
                    id: self.id.clone(),
                    index,
                }])
            }

            Command::CloseDetail => {
                self.ensure_state(ScanState::Results, ScanState::Results)?;
                if !self.detail_open {
                    return Ok(vec![]);
                }

                Ok(vec![Event::DetailClosed { id: self.id.clone() }])
            }

            Command::Reset => Ok(vec![Event::ScanReset]),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::ScanStarted { id } => {
                self.id = id;
                self.state = ScanState::Scanning;
                self.last_error = None;
            }

            Event::ScanCancelled { .. } => {
                self.state = ScanState::Welcome;
            }

            Event::ImageCaptured { image, .. } => {
                self.captured_image = Some(image);
                self.progress = 0;
                self.analysis = None;
                self.last_error = None;
                self.state = ScanState::Processing;
            }

            Event::ProgressAdvanced { progress, .. } => {
                self.progress = progress;
            }

            Event::AnalysisReceived { result, .. } => {
                self.analysis = Some(result);
            }

            Event::AnalysisFailed { message, .. } => {
                self.discard_capture();
                self.last_error = Some(message);
                self.state = ScanState::Scanning;
            }

            Event::ScanCompleted { medications, .. } => {
                self.medications = medications;
                self.selected = None;
                self.detail_open = false;
                self.state = ScanState::Results;
            }

            Event::CaptureDiscarded { .. } => {
                self.discard_capture();
                self.state = ScanState::Scanning;
            }

            Event::MedicationSelected { index, .. } => {
                self.selected = Some(index);
                self.detail_open = true;
            }

            Event::DetailClosed { .. } => {
                self.detail_open = false;
            }

            Event::ScanReset => {
                *self = ScanSession::default();
            }
        }
    }
}

impl ScanSession {
    /// Handles `command` and applies the resulting events to this session.
    pub async fn execute(
        &mut self,
        command: Command,
        services: &Services,
    ) -> Result<Vec<Event>, Error> {
        let events = self.handle(command, services).await?;
        for event in events.iter().cloned() {
            self.apply(event);
        }
        Ok(events)
    }

    /// Fails with `InvalidStateTransition` unless the session is in `expected`.
    pub fn ensure_state(&self, expected: ScanState, to: ScanState) -> Result<(), Error> {
        if self.state != expected {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// Medication currently shown in the detail view.
    pub fn selected_medication(&self) -> Option<&AnalyzedMedication> {
        if !self.detail_open {
            return None;
        }
        self.selected.and_then(|index| self.medications.get(index))
    }

    // The tick that would reach 100 is held until the analysis has arrived.
    fn next_progress_events(&self, services: &Services) -> Result<Vec<Event>, Error> {
        if services.progress_step == 0 {
            return Err(Error::Validation {
                message: "Progress step must be positive".to_string(),
            });
        }

        let next = self
            .progress
            .saturating_add(services.progress_step)
            .min(MAX_PROGRESS);

        if next < MAX_PROGRESS {
            return Ok(vec![Event::ProgressAdvanced {
                id: self.id.clone(),
                progress: next,
            }]);
        }

        match &self.analysis {
            Some(result) => Ok(vec![
                Event::ProgressAdvanced {
                    id: self.id.clone(),
                    progress: MAX_PROGRESS,
                },
                Event::ScanCompleted {
                    id: self.id.clone(),
                    medications: result.medications.clone(),
                },
            ]),
            None => Ok(vec![]),
        }
    }

    fn discard_capture(&mut self) {
        self.captured_image = None;
        self.progress = 0;
        self.analysis = None;
    }
}
