use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::Error;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Which lens to prefer when opening a stream
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FacingMode {
    /// Rear-facing camera
    Environment,
    /// Front-facing camera
    User,
}

/// PNG-encoded still frame
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub png: Vec<u8>,
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Opens an exclusive video stream, preferring `facing` when the device has a choice.
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, Error>;
}

#[async_trait]
pub trait VideoStream: Send {
    async fn capture_frame(&mut self) -> Result<Frame, Error>;

    /// Stops every track of the stream. Must be idempotent.
    fn stop(&mut self);
}

/// Owns an open stream and stops it when dropped.
pub struct StreamGuard {
    stream: Box<dyn VideoStream>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self { stream }
    }

    pub async fn capture_frame(&mut self) -> Result<Frame, Error> {
        self.stream.capture_frame().await
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop();
        tracing::debug!("Camera stream released");
    }
}

/// Camera whose feed is a single PNG file on disk.
#[derive(Clone, Debug)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Camera for StillImageCamera {
    async fn acquire(&self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, Error> {
        let png = tokio::fs::read(&self.path).await.map_err(|e| Error::Camera {
            message: format!("cannot open {}: {}", self.path.display(), e),
        })?;

        if !png.starts_with(&PNG_SIGNATURE) {
            return Err(Error::Camera {
                message: format!("{} is not a PNG image", self.path.display()),
            });
        }

        Ok(Box::new(StillImageStream {
            frame: Some(Frame { png }),
        }))
    }
}

struct StillImageStream {
    // `None` once stopped
    frame: Option<Frame>,
}

#[async_trait]
impl VideoStream for StillImageStream {
    async fn capture_frame(&mut self) -> Result<Frame, Error> {
        self.frame.clone().ok_or(Error::CameraUnavailable)
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
