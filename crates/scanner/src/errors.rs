use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Camera error: {message}")]
    Camera { message: String },

    #[error("No active camera feed")]
    CameraUnavailable,

    #[error("Analysis failed: {message}")]
    Analysis { message: String },

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error(transparent)]
    Domain(#[from] domain::Error),
}
