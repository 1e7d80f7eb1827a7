//! Capture loop and worker supervision.
//!
//! The loop drives the whole pipeline on one dedicated thread:
//! acquire -> grayscale+blur -> background update -> detect -> annotate ->
//! deliver. Frames are processed strictly sequentially; the background model
//! is order-dependent, so there is no parallel frame processing.
//!
//! States: Init -> Warmup -> Running -> Stopped. The warmup cycle seeds the
//! background model from the first frame and runs no detection. The stop flag
//! is checked once per cycle (cooperative, never mid-cycle), and teardown
//! runs unconditionally, including on the fatal acquisition path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use chrono::Local;

use crate::annotate::FrameAnnotator;
use crate::background::{BackgroundModel, DEFAULT_ALPHA};
use crate::detect::{DetectionResult, MotionDetector};
use crate::display::Display;
use crate::frame::ColorFrame;
use crate::ingest::CameraSource;
use crate::stream::StreamTransmitter;

/// Capture loop lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Warmup,
    Running,
    Stopped,
}

/// Orchestrates one capture session.
pub struct CaptureLoop {
    source: CameraSource,
    detector: Option<MotionDetector>,
    annotator: FrameAnnotator,
    transmitter: Option<StreamTransmitter>,
    display: Box<dyn Display>,
    blur_radius: u32,
    state: LoopState,
    cycles: u64,
}

impl CaptureLoop {
    /// Assemble a session from already-constructed collaborators. The source
    /// must be connected; a `None` detector annotates every frame with the
    /// static unoccupied label; a `None` transmitter means local-only
    /// delivery from the start.
    pub fn new(
        source: CameraSource,
        detector: Option<MotionDetector>,
        annotator: FrameAnnotator,
        transmitter: Option<StreamTransmitter>,
        display: Box<dyn Display>,
        blur_radius: u32,
    ) -> Self {
        Self {
            source,
            detector,
            annotator,
            transmitter,
            display,
            blur_radius,
            state: LoopState::Init,
            cycles: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Completed processing cycles (warmup excluded).
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run until the stop flag is raised or frame acquisition fails.
    ///
    /// A failed acquisition is fatal to the loop: the error is returned after
    /// teardown. A failed streaming send is not: the session degrades to the
    /// local display and the loop keeps running.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        let outcome = self.run_cycles(stop);
        self.shutdown();
        outcome
    }

    fn run_cycles(&mut self, stop: &AtomicBool) -> Result<()> {
        self.state = LoopState::Warmup;
        let first = self.source.next_frame().context("acquire warmup frame")?;
        let seed = first.to_gray().box_blur(self.blur_radius);
        log::info!(
            "starting background model ({}x{})",
            seed.width(),
            seed.height()
        );
        let mut background = BackgroundModel::initialize(&seed, DEFAULT_ALPHA);
        self.state = LoopState::Running;

        while !stop.load(Ordering::SeqCst) {
            self.cycle(&mut background)?;
        }
        log::info!("stop requested, leaving capture loop");
        Ok(())
    }

    fn cycle(&mut self, background: &mut BackgroundModel) -> Result<()> {
        let mut frame = self.source.next_frame().context("acquire frame")?;
        let gray = frame.to_gray().box_blur(self.blur_radius);
        let reference = background.update(&gray)?;

        let result = match &self.detector {
            Some(detector) => detector.detect(&gray, &reference)?,
            None => DetectionResult::default(),
        };

        self.annotator.annotate(&mut frame, &result, Local::now());
        self.deliver(&frame, &result);
        self.cycles += 1;
        Ok(())
    }

    /// Stream when the session is still healthy, otherwise hand the frame to
    /// the local display. The frame whose send failed is also displayed, so
    /// no cycle's output is dropped.
    fn deliver(&mut self, frame: &ColorFrame, result: &DetectionResult) {
        if let Some(transmitter) = self.transmitter.as_mut() {
            if transmitter.is_connected() {
                match transmitter.send(frame) {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(err) => {
                        log::warn!("streaming degraded, falling back to local display: {}", err);
                    }
                }
            }
        }
        if let Err(err) = self.display.show(frame, result) {
            log::warn!("local display failed: {}", err);
        }
    }

    /// Unconditional teardown: close the stream session, release the device.
    fn shutdown(&mut self) {
        if let Some(transmitter) = self.transmitter.as_mut() {
            transmitter.shutdown();
        }
        self.source.disconnect();
        self.state = LoopState::Stopped;
        log::info!("capture loop stopped after {} cycles", self.cycles);
    }
}

// ----------------------------------------------------------------------------
// Worker supervision
// ----------------------------------------------------------------------------

/// Spawns a capture loop on a dedicated worker thread.
pub struct CaptureWorker;

impl CaptureWorker {
    pub fn spawn(mut capture: CaptureLoop) -> Result<WorkerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        let join = std::thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || capture.run(&stop_thread))
            .context("spawn capture worker")?;
        Ok(WorkerHandle {
            stop,
            join: Some(join),
        })
    }
}

/// Handle to a running capture worker.
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<Result<()>>>,
}

impl WorkerHandle {
    /// Shared stop flag, for wiring into signal handlers.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join
            .as_ref()
            .map(|join| join.is_finished())
            .unwrap_or(true)
    }

    /// Raise the stop flag and wait for the in-flight cycle to complete.
    pub fn stop(self) -> Result<()> {
        self.stop.store(true, Ordering::SeqCst);
        self.join()
    }

    /// Wait for the worker to exit on its own (stop flag or fatal error).
    pub fn join(mut self) -> Result<()> {
        if let Some(join) = self.join.take() {
            return join
                .join()
                .map_err(|_| anyhow!("capture worker panicked"))?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::LogDisplay;
    use crate::ingest::CameraConfig;

    fn stub_loop(device: &str, connect: bool) -> CaptureLoop {
        let config = CameraConfig {
            device: device.to_string(),
            target_fps: 0,
            width: 160,
            height: 120,
        };
        let mut source = CameraSource::new(config).unwrap();
        if connect {
            source.connect().unwrap();
        }
        CaptureLoop::new(
            source,
            Some(MotionDetector::new(25, 500)),
            FrameAnnotator::new("Occupied", "Unoccupied"),
            None,
            Box::new(LogDisplay::new()),
            2,
        )
    }

    #[test]
    fn raised_stop_flag_ends_the_loop_after_warmup() {
        let mut capture = stub_loop("stub://static", true);
        assert_eq!(capture.state(), LoopState::Init);

        let stop = AtomicBool::new(true);
        capture.run(&stop).unwrap();
        assert_eq!(capture.state(), LoopState::Stopped);
        assert_eq!(capture.cycles(), 0);
    }

    #[test]
    fn failed_warmup_acquisition_is_fatal_but_torn_down() {
        let mut capture = stub_loop("stub://static", false);
        let stop = AtomicBool::new(false);
        assert!(capture.run(&stop).is_err());
        assert_eq!(capture.state(), LoopState::Stopped);
    }

    #[test]
    fn worker_stops_cooperatively() {
        let capture = stub_loop("stub://static", true);
        let handle = CaptureWorker::spawn(capture).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!handle.is_finished());
        handle.stop().unwrap();
    }
}
