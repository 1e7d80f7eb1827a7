//! motion-sentry
//!
//! An unattended occupancy monitoring node: frames are pulled from a capture
//! device, diffed against an adaptive exponential-moving-average background,
//! annotated with occupancy state, and delivered either to a remote consumer
//! over a length-prefixed TCP stream or to the local display boundary.
//!
//! # Architecture
//!
//! The capture loop owns the whole pipeline and runs it on one dedicated
//! worker thread, strictly one frame at a time (the background model is
//! order-dependent):
//!
//! ```text
//! CameraSource -> gray+blur -> BackgroundModel -> MotionDetector
//!              -> FrameAnnotator -> StreamTransmitter | Display
//! ```
//!
//! Failure policy: a failed frame read is fatal to the loop (orderly
//! teardown, no partial-frame recovery); streaming failures are absorbed
//! into the session (one-shot degrade to local display, no retry); only
//! empty device discovery terminates the process with a nonzero status.
//!
//! # Module Structure
//!
//! - `frame`: owned RGB / luma pixel containers, grayscale, blur
//! - `background`: EMA reference image
//! - `detect`: change mask, dilation, connected regions, area filter
//! - `annotate`: status line, timestamp, bounding boxes, bitmap font
//! - `stream`: length-prefixed JPEG transmitter
//! - `display`: local presentation boundary
//! - `ingest`: camera sources and device discovery
//! - `capture`: loop state machine and worker supervision
//! - `config`: typed startup configuration

pub mod annotate;
pub mod background;
pub mod capture;
pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod stream;

pub use annotate::FrameAnnotator;
pub use background::{BackgroundModel, DEFAULT_ALPHA};
pub use capture::{CaptureLoop, CaptureWorker, LoopState, WorkerHandle};
pub use config::{
    AnnotateSettings, CameraSettings, DetectionSettings, SentryConfig, StreamSettings,
};
pub use detect::{DetectionResult, MotionDetector, Region};
pub use display::{Display, LogDisplay};
pub use frame::{ColorFrame, GrayFrame};
pub use ingest::{
    discover_devices, CameraConfig, CameraDevice, CameraSource, CameraStats, DEFAULT_DEVICE_DIR,
};
pub use stream::{StreamError, StreamTransmitter};
