//! Frame acquisition.
//!
//! This module provides the sources the capture loop pulls color frames from:
//! - V4L2 devices (feature: ingest-v4l2)
//! - Synthetic scenes for `stub://` device paths (tests, demos)
//!
//! plus discovery of capture device nodes.
//!
//! Sources deliver frames at the device's own pace; acquiring a frame may
//! block until the device produces one. A failed read is fatal to the capture
//! session, so sources do not retry internally.

mod discover;
mod synthetic;
#[cfg(feature = "ingest-v4l2")]
mod v4l2;

pub use discover::{discover_devices, CameraDevice, DEFAULT_DEVICE_DIR};
pub use synthetic::{SYNTHETIC_BLOCK_SIZE, SYNTHETIC_MOTION_PERIOD};

use anyhow::Result;

use crate::frame::ColorFrame;
use synthetic::SyntheticCameraSource;
#[cfg(feature = "ingest-v4l2")]
use v4l2::DeviceCameraSource;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0") or a `stub://` scene.
    pub device: String,
    /// Target frame rate; 0 lets the device free-run.
    pub target_fps: u32,
    /// Requested frame width. Best-effort: the device may substitute its own.
    pub width: u32,
    /// Requested frame height. Best-effort: the device may substitute its own.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
///
/// `stub://` device paths select a deterministic synthetic backend; anything
/// else requires the `ingest-v4l2` feature and a real device node.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCameraSource),
    #[cfg(feature = "ingest-v4l2")]
    Device(DeviceCameraSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCameraSource::new(config)),
            });
        }
        #[cfg(feature = "ingest-v4l2")]
        {
            Ok(Self {
                backend: CameraBackend::Device(DeviceCameraSource::new(config)?),
            })
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            Err(anyhow::anyhow!(
                "device capture from {} requires the ingest-v4l2 feature",
                config.device
            ))
        }
    }

    /// Open the device and negotiate capture format.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.connect(),
        }
    }

    /// Acquire the next frame, blocking until the device delivers one.
    pub fn next_frame(&mut self) -> Result<ColorFrame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.is_healthy(),
        }
    }

    /// Release the device. Further `next_frame` calls fail.
    pub fn disconnect(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.disconnect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.disconnect(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}
