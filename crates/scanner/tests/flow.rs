//! Scan flow tests driven with a fake camera and analysis client.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use domain::{
    medications::{fixed_analysis, AnalysisResult, CapturedImage},
    scans::ScanState,
    Error as DomainError,
};
use scanner::{
    AnalysisClient, Camera, Error, FacingMode, Frame, ScanFlowController, ScannerConfig, Screen,
    SignalOutcome, VideoStream,
};
use tokio::sync::Notify;

const FRAME: &[u8] = b"\x89PNG fake frame";

#[derive(Default)]
struct CameraLog {
    acquired: AtomicUsize,
    stopped: AtomicUsize,
}

struct FakeCamera {
    log: Arc<CameraLog>,
    fail: bool,
}

struct FakeStream {
    log: Arc<CameraLog>,
    live: bool,
}

#[async_trait]
impl Camera for FakeCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, Error> {
        assert_eq!(facing, FacingMode::Environment);
        if self.fail {
            return Err(Error::Camera {
                message: "permission denied".to_string(),
            });
        }
        self.log.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            log: self.log.clone(),
            live: true,
        }))
    }
}

#[async_trait]
impl VideoStream for FakeStream {
    async fn capture_frame(&mut self) -> Result<Frame, Error> {
        Ok(Frame {
            png: FRAME.to_vec(),
        })
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.log.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

enum Reply {
    Immediate,
    AfterNotify(Arc<Notify>),
    Fail,
}

struct FakeClient {
    reply: Reply,
    images: Mutex<Vec<String>>,
}

impl FakeClient {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            images: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AnalysisClient for FakeClient {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, Error> {
        self.images.lock().unwrap().push(image.as_str().to_string());
        match &self.reply {
            Reply::Immediate => Ok(fixed_analysis()),
            Reply::AfterNotify(notify) => {
                notify.notified().await;
                Ok(fixed_analysis())
            }
            Reply::Fail => Err(Error::Analysis {
                message: "Failed to analyze prescription".to_string(),
            }),
        }
    }
}

fn controller(camera_fails: bool, client: Arc<FakeClient>) -> (ScanFlowController, Arc<CameraLog>) {
    let log = Arc::new(CameraLog::default());
    let camera = Arc::new(FakeCamera {
        log: log.clone(),
        fail: camera_fails,
    });
    let flow = ScanFlowController::new(camera, client, &ScannerConfig::default());
    (flow, log)
}

async fn scanning_with_feed(flow: &mut ScanFlowController) {
    flow.start().await.unwrap();
    assert!(flow.wait_for_camera().await.unwrap());
}

/// Processes signals until nothing arrives for a full second.
async fn drain(flow: &mut ScanFlowController) -> Vec<SignalOutcome> {
    let mut outcomes = Vec::new();
    while let Ok(outcome) =
        tokio::time::timeout(Duration::from_secs(1), flow.process_next_signal()).await
    {
        outcomes.push(outcome.unwrap());
    }
    outcomes
}

#[tokio::test(start_paused = true)]
async fn start_opens_only_the_scanner() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Immediate));
    assert_eq!(flow.state(), ScanState::Welcome);

    flow.start().await.unwrap();
    assert_eq!(flow.state(), ScanState::Scanning);

    assert!(flow.wait_for_camera().await.unwrap());
    assert_eq!(flow.state(), ScanState::Scanning);
    assert_eq!(log.acquired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn capture_starts_processing_from_zero_and_releases_the_camera() {
    let client = FakeClient::new(Reply::AfterNotify(Arc::new(Notify::new())));
    let (mut flow, log) = controller(false, client.clone());
    scanning_with_feed(&mut flow).await;

    flow.capture().await.unwrap();

    assert_eq!(flow.state(), ScanState::Processing);
    assert_eq!(flow.progress(), 0);
    assert!(!flow.has_camera_feed());
    assert_eq!(log.stopped.load(Ordering::SeqCst), 1);

    let expected = CapturedImage::from_png(FRAME);
    assert_eq!(flow.session().captured_image.as_ref(), Some(&expected));

    tokio::task::yield_now().await;
    assert_eq!(*client.images.lock().unwrap(), vec![expected.into_inner()]);
}

#[tokio::test(start_paused = true)]
async fn progress_climbs_in_fixed_steps_and_completes_once() {
    let (mut flow, _) = controller(false, FakeClient::new(Reply::Immediate));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();

    let mut outcomes = Vec::new();
    while flow.state() == ScanState::Processing {
        outcomes.push(flow.process_next_signal().await.unwrap());
    }
    outcomes.extend(drain(&mut flow).await);

    let steps: Vec<u8> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            SignalOutcome::ProgressAdvanced(progress) => Some(*progress),
            _ => None,
        })
        .collect();
    let expected: Vec<u8> = (1..20).map(|n| n * 5).collect();
    assert_eq!(steps, expected);

    let completions = outcomes
        .iter()
        .filter(|outcome| **outcome == SignalOutcome::Completed)
        .count();
    assert_eq!(completions, 1);

    assert_eq!(flow.state(), ScanState::Results);
    assert_eq!(flow.progress(), 100);
    assert_eq!(flow.session().medications, fixed_analysis().medications);
}

#[tokio::test(start_paused = true)]
async fn progress_waits_at_95_for_the_endpoint() {
    let notify = Arc::new(Notify::new());
    let (mut flow, _) = controller(false, FakeClient::new(Reply::AfterNotify(notify.clone())));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();

    let mut held = 0;
    while held < 3 {
        if flow.process_next_signal().await.unwrap() == SignalOutcome::ProgressHeld {
            held += 1;
        }
    }
    assert_eq!(flow.state(), ScanState::Processing);
    assert_eq!(flow.progress(), 95);

    notify.notify_one();

    assert_eq!(flow.wait_for_analysis().await.unwrap(), ScanState::Results);
    assert_eq!(flow.progress(), 100);
    assert_eq!(flow.session().medications.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn retake_discards_the_capture_and_silences_the_timer() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Immediate));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();

    while flow.progress() < 15 {
        flow.process_next_signal().await.unwrap();
    }

    flow.retake().await.unwrap();
    assert_eq!(flow.state(), ScanState::Scanning);
    assert_eq!(flow.progress(), 0);
    assert!(flow.session().captured_image.is_none());

    let outcomes = drain(&mut flow).await;
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, SignalOutcome::Stale | SignalOutcome::CameraAttached)));
    assert!(outcomes.contains(&SignalOutcome::CameraAttached));

    assert_eq!(flow.state(), ScanState::Scanning);
    assert_eq!(flow.progress(), 0);
    assert!(flow.session().analysis.is_none());
    assert_eq!(log.acquired.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_from_results_clears_everything() {
    let (mut flow, _) = controller(false, FakeClient::new(Reply::Immediate));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();
    flow.wait_for_analysis().await.unwrap();
    flow.select_medication(1).await.unwrap();

    flow.reset().await.unwrap();

    let session = flow.session();
    assert_eq!(flow.state(), ScanState::Welcome);
    assert!(session.captured_image.is_none());
    assert!(session.medications.is_empty());
    assert!(session.selected.is_none());
    assert_eq!(flow.screen(), Screen::Welcome);
}

#[tokio::test(start_paused = true)]
async fn reset_and_cancel_release_the_camera() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Immediate));

    scanning_with_feed(&mut flow).await;
    flow.reset().await.unwrap();
    assert_eq!(log.stopped.load(Ordering::SeqCst), 1);

    scanning_with_feed(&mut flow).await;
    flow.cancel_scan().await.unwrap();
    assert_eq!(flow.state(), ScanState::Welcome);
    assert_eq!(log.stopped.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn late_camera_stream_is_released_after_cancel() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Immediate));

    flow.start().await.unwrap();
    flow.cancel_scan().await.unwrap();

    // Sitting on the welcome screen: nobody processes signals
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(flow.state(), ScanState::Welcome);
    assert_eq!(log.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(log.stopped.load(Ordering::SeqCst), 1);

    assert!(drain(&mut flow).await.is_empty());
    assert!(!flow.has_camera_feed());
}

#[tokio::test(start_paused = true)]
async fn reset_during_processing_ignores_ticks_and_late_analysis() {
    let notify = Arc::new(Notify::new());
    let (mut flow, _) = controller(false, FakeClient::new(Reply::AfterNotify(notify.clone())));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();

    while flow.progress() < 20 {
        flow.process_next_signal().await.unwrap();
    }

    flow.reset().await.unwrap();
    notify.notify_one();

    let outcomes = drain(&mut flow).await;
    assert!(outcomes.iter().all(|o| *o == SignalOutcome::Stale));

    let session = flow.session();
    assert_eq!(flow.state(), ScanState::Welcome);
    assert_eq!(flow.progress(), 0);
    assert!(session.analysis.is_none());
    assert!(session.captured_image.is_none());
    assert!(session.medications.is_empty());
    assert!(session.selected.is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_releases_the_camera() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Immediate));
    scanning_with_feed(&mut flow).await;

    drop(flow);

    assert_eq!(log.stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn camera_failure_leaves_scanning_without_feed() {
    let (mut flow, _) = controller(true, FakeClient::new(Reply::Immediate));

    flow.start().await.unwrap();
    assert!(!flow.wait_for_camera().await.unwrap());
    assert_eq!(flow.state(), ScanState::Scanning);
    assert!(!flow.has_camera_feed());

    assert!(matches!(flow.capture().await, Err(Error::CameraUnavailable)));
    assert_eq!(flow.state(), ScanState::Scanning);
    assert_eq!(
        flow.screen(),
        Screen::Scanning {
            feed_active: false,
            error: None,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn capture_outside_scanning_is_rejected() {
    let (mut flow, _) = controller(false, FakeClient::new(Reply::Immediate));

    let err = flow.capture().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Domain(DomainError::InvalidStateTransition { ref from, ref to })
            if from == "welcome" && to == "processing"
    ));
    assert_eq!(flow.state(), ScanState::Welcome);
}

#[tokio::test(start_paused = true)]
async fn failed_analysis_returns_to_the_camera_with_an_error() {
    let (mut flow, log) = controller(false, FakeClient::new(Reply::Fail));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();

    assert_eq!(flow.wait_for_analysis().await.unwrap(), ScanState::Scanning);
    assert!(flow.wait_for_camera().await.unwrap());

    assert!(flow.session().captured_image.is_none());
    assert_eq!(log.acquired.load(Ordering::SeqCst), 2);
    match flow.screen() {
        Screen::Scanning { feed_active, error } => {
            assert!(feed_active);
            assert_eq!(
                error,
                Some("Analysis failed: Failed to analyze prescription")
            );
        }
        other => panic!("expected scanning screen, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn detail_view_opens_and_closes_within_results() {
    let (mut flow, _) = controller(false, FakeClient::new(Reply::Immediate));
    scanning_with_feed(&mut flow).await;
    flow.capture().await.unwrap();
    flow.wait_for_analysis().await.unwrap();

    flow.select_medication(0).await.unwrap();
    assert_eq!(flow.state(), ScanState::Results);
    assert!(matches!(
        flow.screen(),
        Screen::Detail { medication, .. } if medication.info.name == "Amoxicillin"
    ));

    flow.close_detail().await.unwrap();
    assert_eq!(flow.state(), ScanState::Results);
    assert!(matches!(flow.screen(), Screen::Results { .. }));

    assert!(flow.select_medication(5).await.is_err());
}
