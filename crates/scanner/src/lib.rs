//! Scan flow controller for the prescription scanner

/// Camera devices and scoped video streams
pub mod camera;

/// Analysis endpoint client
pub mod client;

/// Environment configuration
pub mod config;

/// Scan flow state owner
pub mod controller;

/// Scanner errors
pub mod errors;

/// Cancellable progress simulation
pub mod progress;

/// Screen projection of the scan session
pub mod screen;

pub use camera::{Camera, FacingMode, Frame, StillImageCamera, StreamGuard, VideoStream};
pub use client::{AnalysisClient, HttpAnalysisClient};
pub use config::ScannerConfig;
pub use controller::{FlowSignal, ScanFlowController, SignalOutcome};
pub use errors::Error;
pub use screen::Screen;
