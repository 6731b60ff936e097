use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use domain::{
    medications::{AnalysisResult, CapturedImage},
    scans::{Command, ScanSession, ScanState, Services},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};
use ulid::Ulid;

use crate::{
    camera::{Camera, FacingMode, StreamGuard},
    client::AnalysisClient,
    config::ScannerConfig,
    errors::Error,
    progress::ProgressTimer,
    screen::Screen,
};

/// Results of background work, delivered back to the controller.
///
/// Every signal carries the epoch it was started in. A signal whose epoch is
/// no longer current is dropped unread. Camera streams are checked against the
/// epoch before they are sent, so a late stream never waits in the channel.
pub enum FlowSignal {
    CameraReady {
        epoch: u64,
        result: Result<StreamGuard, Error>,
    },
    Tick {
        epoch: u64,
    },
    AnalysisFinished {
        epoch: u64,
        result: Result<AnalysisResult, Error>,
    },
}

impl FlowSignal {
    pub fn epoch(&self) -> u64 {
        match self {
            FlowSignal::CameraReady { epoch, .. }
            | FlowSignal::Tick { epoch }
            | FlowSignal::AnalysisFinished { epoch, .. } => *epoch,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FlowSignal::CameraReady { .. } => "camera",
            FlowSignal::Tick { .. } => "tick",
            FlowSignal::AnalysisFinished { .. } => "analysis",
        }
    }
}

/// What handling one signal did to the flow
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignalOutcome {
    /// Signal belonged to a phase that has already ended
    Stale,
    CameraAttached,
    CameraFailed,
    ProgressAdvanced(u8),
    /// Progress is waiting on the analysis response
    ProgressHeld,
    AnalysisRecorded,
    AnalysisFailed,
    /// Progress reached 100 and the results are shown
    Completed,
}

/// Single owner of the scan session and of every resource tied to its phases.
///
/// The camera stream exists only while scanning and the progress timer only
/// while processing; both are released by dropping their guards, which also
/// happens when the controller itself is dropped.
pub struct ScanFlowController {
    session: ScanSession,
    services: Services,
    camera: Arc<dyn Camera>,
    client: Arc<dyn AnalysisClient>,
    progress_interval: Duration,
    stream: Option<StreamGuard>,
    timer: Option<ProgressTimer>,
    // Shared with camera tasks; held while they send and while it advances
    epoch: Arc<Mutex<u64>>,
    signals_tx: UnboundedSender<FlowSignal>,
    signals_rx: UnboundedReceiver<FlowSignal>,
}

impl ScanFlowController {
    pub fn new(
        camera: Arc<dyn Camera>,
        client: Arc<dyn AnalysisClient>,
        config: &ScannerConfig,
    ) -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        Self {
            session: ScanSession::default(),
            services: config.services(),
            camera,
            client,
            progress_interval: config.progress_interval,
            stream: None,
            timer: None,
            epoch: Arc::new(Mutex::new(0)),
            signals_tx,
            signals_rx,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn state(&self) -> ScanState {
        self.session.state
    }

    pub fn progress(&self) -> u8 {
        self.session.progress
    }

    pub fn has_camera_feed(&self) -> bool {
        self.stream.is_some()
    }

    pub fn screen(&self) -> Screen<'_> {
        Screen::from_session(&self.session, self.has_camera_feed())
    }

    /// welcome -> scanning, then opens the camera in the background.
    pub async fn start(&mut self) -> Result<(), Error> {
        let id = Ulid::new().to_string();
        self.session
            .execute(Command::StartScan { id }, &self.services)
            .await?;

        info!("Scan {} started", self.session.id);
        self.enter_scanning();
        Ok(())
    }

    /// scanning -> welcome without capturing.
    pub async fn cancel_scan(&mut self) -> Result<(), Error> {
        self.session
            .execute(Command::CancelScan, &self.services)
            .await?;

        self.release_camera();
        self.advance_epoch();
        info!("Scan cancelled");
        Ok(())
    }

    /// scanning -> processing: grabs a still frame, then starts the progress
    /// simulation and the analysis call.
    pub async fn capture(&mut self) -> Result<(), Error> {
        self.session
            .ensure_state(ScanState::Scanning, ScanState::Processing)?;

        let stream = self.stream.as_mut().ok_or(Error::CameraUnavailable)?;
        let frame = stream.capture_frame().await?;
        let image = CapturedImage::from_png(&frame.png);

        self.session
            .execute(
                Command::CaptureImage {
                    image: image.clone(),
                },
                &self.services,
            )
            .await?;

        self.release_camera();
        let epoch = self.advance_epoch();

        self.timer = Some(ProgressTimer::start(
            self.progress_interval,
            epoch,
            self.signals_tx.clone(),
        ));

        let client = Arc::clone(&self.client);
        let signals = self.signals_tx.clone();
        tokio::spawn(async move {
            let result = client.analyze(&image).await;
            let _ = signals.send(FlowSignal::AnalysisFinished { epoch, result });
        });

        info!(
            "Captured {} bytes for scan {}, analysis started",
            frame.png.len(),
            self.session.id
        );
        Ok(())
    }

    /// processing -> scanning, discarding the captured image.
    pub async fn retake(&mut self) -> Result<(), Error> {
        self.session
            .execute(Command::RetakePicture, &self.services)
            .await?;

        self.timer = None;
        info!("Capture discarded for scan {}", self.session.id);
        self.enter_scanning();
        Ok(())
    }

    /// Any state -> welcome, dropping all transient data.
    pub async fn reset(&mut self) -> Result<(), Error> {
        self.session.execute(Command::Reset, &self.services).await?;

        self.release_camera();
        self.timer = None;
        self.advance_epoch();
        info!("Scan reset");
        Ok(())
    }

    pub async fn select_medication(&mut self, index: usize) -> Result<(), Error> {
        self.session
            .execute(Command::SelectMedication { index }, &self.services)
            .await?;
        Ok(())
    }

    pub async fn close_detail(&mut self) -> Result<(), Error> {
        self.session
            .execute(Command::CloseDetail, &self.services)
            .await?;
        Ok(())
    }

    /// Waits for the next background signal and applies it.
    pub async fn process_next_signal(&mut self) -> Result<SignalOutcome, Error> {
        // The controller keeps a sender, so the channel cannot close
        let Some(signal) = self.signals_rx.recv().await else {
            return Ok(SignalOutcome::Stale);
        };
        self.handle_signal(signal).await
    }

    /// Processes signals until the camera answers for the current scan.
    ///
    /// Returns whether a feed is active. Outside `scanning` this returns
    /// immediately with `false`.
    pub async fn wait_for_camera(&mut self) -> Result<bool, Error> {
        loop {
            if self.session.state != ScanState::Scanning {
                return Ok(false);
            }
            if self.stream.is_some() {
                return Ok(true);
            }
            if self.process_next_signal().await? == SignalOutcome::CameraFailed {
                return Ok(false);
            }
        }
    }

    /// Processes signals until the session leaves `processing`.
    pub async fn wait_for_analysis(&mut self) -> Result<ScanState, Error> {
        while self.session.state == ScanState::Processing {
            self.process_next_signal().await?;
        }
        Ok(self.session.state)
    }

    async fn handle_signal(&mut self, signal: FlowSignal) -> Result<SignalOutcome, Error> {
        let current = *lock_epoch(&self.epoch);
        if signal.epoch() != current {
            debug!(
                "Ignoring stale {} signal from epoch {} (current {})",
                signal.kind(),
                signal.epoch(),
                current
            );
            return Ok(SignalOutcome::Stale);
        }

        match signal {
            FlowSignal::CameraReady {
                result: Ok(stream), ..
            } => {
                self.stream = Some(stream);
                info!("Camera feed active");
                Ok(SignalOutcome::CameraAttached)
            }

            FlowSignal::CameraReady { result: Err(e), .. } => {
                // No retry: the scanner stays open without a feed
                error!("Error accessing camera: {}", e);
                Ok(SignalOutcome::CameraFailed)
            }

            FlowSignal::Tick { .. } => self.on_tick().await,

            FlowSignal::AnalysisFinished {
                result: Ok(result), ..
            } => {
                info!(
                    "Analysis received for scan {}: {} medications",
                    self.session.id,
                    result.medications.len()
                );
                self.session
                    .execute(Command::RecordAnalysis { result }, &self.services)
                    .await?;
                Ok(SignalOutcome::AnalysisRecorded)
            }

            FlowSignal::AnalysisFinished { result: Err(e), .. } => {
                error!("Error analyzing prescription: {}", e);
                self.session
                    .execute(
                        Command::FailAnalysis {
                            message: e.to_string(),
                        },
                        &self.services,
                    )
                    .await?;

                self.timer = None;
                self.enter_scanning();
                Ok(SignalOutcome::AnalysisFailed)
            }
        }
    }

    async fn on_tick(&mut self) -> Result<SignalOutcome, Error> {
        let events = self
            .session
            .execute(Command::AdvanceProgress, &self.services)
            .await?;

        if self.session.state == ScanState::Results {
            self.timer = None;
            self.advance_epoch();
            info!(
                "Scan {} complete: {} medications identified",
                self.session.id,
                self.session.medications.len()
            );
            return Ok(SignalOutcome::Completed);
        }

        if events.is_empty() {
            return Ok(SignalOutcome::ProgressHeld);
        }
        Ok(SignalOutcome::ProgressAdvanced(self.session.progress))
    }

    fn enter_scanning(&mut self) {
        let epoch = self.advance_epoch();
        let camera = Arc::clone(&self.camera);
        let signals = self.signals_tx.clone();
        let current_epoch = Arc::clone(&self.epoch);

        tokio::spawn(async move {
            let result = camera
                .acquire(FacingMode::Environment)
                .await
                .map(StreamGuard::new);

            let rejected = {
                let current = lock_epoch(&current_epoch);
                if *current == epoch {
                    // A closed channel hands the signal back and it is dropped below
                    signals
                        .send(FlowSignal::CameraReady { epoch, result })
                        .err()
                        .map(|e| e.0)
                } else {
                    Some(FlowSignal::CameraReady { epoch, result })
                }
            };

            if rejected.is_some() {
                debug!("Camera answered after scanning ended, releasing it");
            }
            // Dropping the signal drops its guard, stopping the stream
            drop(rejected);
        });
    }

    fn release_camera(&mut self) {
        if self.stream.take().is_some() {
            info!("Camera feed released");
        }
    }

    /// Moves to a new epoch and discards every signal queued for older ones.
    fn advance_epoch(&mut self) -> u64 {
        let mut epoch = lock_epoch(&self.epoch);
        *epoch += 1;

        // Nothing for the new epoch has been spawned yet, so all of these are stale
        while let Ok(signal) = self.signals_rx.try_recv() {
            debug!("Discarding queued {} signal from epoch {}", signal.kind(), signal.epoch());
        }
        *epoch
    }
}

fn lock_epoch(epoch: &Mutex<u64>) -> MutexGuard<'_, u64> {
    // The guarded value is a plain counter, so a poisoned lock is still usable
    epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
