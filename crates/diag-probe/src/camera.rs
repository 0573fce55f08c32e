//! Local camera probe.
//!
//! Opens a capture device, reads a handful of frames with a short pause
//! between them, and reports the shape of each frame or the failed read.

use diag_core::error::Result;
use std::fmt;
use std::time::Duration;

/// Dimensions of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub rows: u32,
    pub cols: u32,
    pub channels: u32,
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.rows, self.cols, self.channels)
    }
}

/// Anything that yields frames. `None` is a failed or empty read.
pub trait FrameSource {
    fn read_frame(&mut self) -> Option<FrameShape>;
}

/// Outcome of a camera probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraReport {
    pub opened: bool,
    /// One entry per attempted read, in order.
    pub frames: Vec<Option<FrameShape>>,
}

impl CameraReport {
    pub fn frames_read(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    pub fn lines(&self) -> Vec<String> {
        if !self.opened {
            return vec!["❌ Camera not available".to_string()];
        }
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| match frame {
                Some(shape) => format!("✅ Camera frame {}: {}", i + 1, shape),
                None => format!("❌ Failed to read frame {}", i + 1),
            })
            .collect()
    }
}

/// Reads a fixed number of frames from a source.
#[derive(Debug, Clone)]
pub struct CameraProbe {
    pub frames: u32,
    pub interval: Duration,
}

impl CameraProbe {
    pub fn new(frames: u32, interval: Duration) -> Self {
        Self { frames, interval }
    }

    /// Run against `source`; `None` means the device could not be opened.
    pub fn run<S: FrameSource + ?Sized>(&self, source: Option<&mut S>) -> CameraReport {
        let Some(source) = source else {
            tracing::warn!("Camera device could not be opened");
            return CameraReport {
                opened: false,
                frames: Vec::new(),
            };
        };

        let mut frames = Vec::with_capacity(self.frames as usize);
        for i in 0..self.frames {
            let frame = source.read_frame();
            tracing::debug!(frame = i + 1, ok = frame.is_some(), "Camera read");
            frames.push(frame);
            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }

        CameraReport {
            opened: true,
            frames,
        }
    }
}

/// Open capture device `device`.
///
/// Returns `Ok(None)` when the backend reports the device as not opened.
#[cfg(feature = "opencv")]
pub fn open_camera(device: i32) -> Result<Option<Box<dyn FrameSource>>> {
    let camera = opencv_backend::OpenCvCamera::open(device)?;
    Ok(camera.map(|c| Box::new(c) as Box<dyn FrameSource>))
}

/// Open capture device `device`.
///
/// Without the `opencv` feature there is no capture backend.
#[cfg(not(feature = "opencv"))]
pub fn open_camera(device: i32) -> Result<Option<Box<dyn FrameSource>>> {
    Err(diag_core::DiagError::Camera(format!(
        "cannot open device {}: built without the `opencv` feature",
        device
    )))
}

#[cfg(feature = "opencv")]
mod opencv_backend {
    use super::{FrameShape, FrameSource};
    use diag_core::error::{DiagError, Result};
    use opencv::prelude::*;
    use opencv::videoio::{VideoCapture, CAP_ANY};

    pub struct OpenCvCamera {
        capture: VideoCapture,
    }

    impl OpenCvCamera {
        pub fn open(device: i32) -> Result<Option<Self>> {
            let capture = VideoCapture::new(device, CAP_ANY).map_err(camera_error)?;
            if !capture.is_opened().map_err(camera_error)? {
                return Ok(None);
            }
            Ok(Some(Self { capture }))
        }
    }

    impl FrameSource for OpenCvCamera {
        fn read_frame(&mut self) -> Option<FrameShape> {
            let mut frame = Mat::default();
            match self.capture.read(&mut frame) {
                Ok(true) if !frame.empty() => Some(FrameShape {
                    rows: frame.rows().max(0) as u32,
                    cols: frame.cols().max(0) as u32,
                    channels: frame.channels().max(0) as u32,
                }),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("Frame read error: {}", e);
                    None
                }
            }
        }
    }

    impl Drop for OpenCvCamera {
        fn drop(&mut self) {
            if let Err(e) = self.capture.release() {
                tracing::warn!("Failed to release camera: {}", e);
            }
        }
    }

    fn camera_error(e: opencv::Error) -> DiagError {
        DiagError::Camera(e.to_string())
    }
}
