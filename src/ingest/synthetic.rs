//! Synthetic frame source for `stub://` device paths.
//!
//! Produces fully deterministic scenes so the pipeline can be exercised
//! without hardware:
//!
//! - `stub://static`: a scene that never changes after the first frame.
//! - `stub://motion` (and any other `stub://` path): the same scene with a
//!   bright block injected every [`SYNTHETIC_MOTION_PERIOD`]th frame,
//!   simulating an object entering the view.

use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{CameraConfig, CameraStats};
use crate::frame::ColorFrame;

/// Frames between injected motion events in the `stub://motion` scene.
pub const SYNTHETIC_MOTION_PERIOD: u64 = 10;
/// Edge length of the injected block, in pixels.
pub const SYNTHETIC_BLOCK_SIZE: u32 = 60;

const BLOCK_OFFSET: u32 = 30;
const BACKGROUND_VALUE: u8 = 16;
const BLOCK_VALUE: u8 = 240;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SyntheticScene {
    Static,
    Motion,
}

pub(crate) struct SyntheticCameraSource {
    config: CameraConfig,
    scene: SyntheticScene,
    connected: bool,
    frame_count: u64,
}

impl SyntheticCameraSource {
    pub(crate) fn new(config: CameraConfig) -> Self {
        let scene = if config.device == "stub://static" {
            SyntheticScene::Static
        } else {
            SyntheticScene::Motion
        };
        Self {
            config,
            scene,
            connected: false,
            frame_count: 0,
        }
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!(
            "CameraSource: connected to {} (synthetic, {:?} scene)",
            self.config.device,
            self.scene
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<ColorFrame> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected"));
        }
        // Simulate device pacing; frame delivery is the loop's clock.
        if self.config.target_fps > 0 {
            std::thread::sleep(Duration::from_millis(
                (1000 / self.config.target_fps.max(1)) as u64,
            ));
        }
        self.frame_count += 1;

        let background = [BACKGROUND_VALUE; 3];
        let mut frame = ColorFrame::from_pixel(self.config.width, self.config.height, background);

        let inject = self.scene == SyntheticScene::Motion
            && self.frame_count % SYNTHETIC_MOTION_PERIOD == 0;
        if inject {
            for y in BLOCK_OFFSET..BLOCK_OFFSET + SYNTHETIC_BLOCK_SIZE {
                for x in BLOCK_OFFSET..BLOCK_OFFSET + SYNTHETIC_BLOCK_SIZE {
                    frame.put_pixel(x as i64, y as i64, [BLOCK_VALUE, BLOCK_VALUE, BLOCK_VALUE]);
                }
            }
        }

        Ok(frame)
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.connected
    }

    pub(crate) fn disconnect(&mut self) {
        self.connected = false;
        log::debug!("CameraSource: released {} (synthetic)", self.config.device);
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(device: &str) -> CameraConfig {
        CameraConfig {
            device: device.to_string(),
            target_fps: 0,
            width: 160,
            height: 120,
        }
    }

    #[test]
    fn requires_connect_before_frames() {
        let mut source = SyntheticCameraSource::new(stub_config("stub://static"));
        assert!(source.next_frame().is_err());
        source.connect().unwrap();
        assert!(source.next_frame().is_ok());
    }

    #[test]
    fn static_scene_never_changes() {
        let mut source = SyntheticCameraSource::new(stub_config("stub://static"));
        source.connect().unwrap();
        let first = source.next_frame().unwrap();
        for _ in 0..SYNTHETIC_MOTION_PERIOD * 2 {
            assert_eq!(source.next_frame().unwrap(), first);
        }
    }

    #[test]
    fn motion_scene_injects_a_block_periodically() {
        let mut source = SyntheticCameraSource::new(stub_config("stub://motion"));
        source.connect().unwrap();

        let mut bright_frames = Vec::new();
        for n in 1..=SYNTHETIC_MOTION_PERIOD * 2 {
            let frame = source.next_frame().unwrap();
            if frame.data().iter().any(|&p| p == BLOCK_VALUE) {
                bright_frames.push(n);
            }
        }
        assert_eq!(
            bright_frames,
            vec![SYNTHETIC_MOTION_PERIOD, SYNTHETIC_MOTION_PERIOD * 2]
        );
    }

    #[test]
    fn frames_match_requested_dimensions() {
        let mut source = SyntheticCameraSource::new(stub_config("stub://static"));
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
    }

    #[test]
    fn disconnect_stops_the_source() {
        let mut source = SyntheticCameraSource::new(stub_config("stub://static"));
        source.connect().unwrap();
        source.next_frame().unwrap();
        source.disconnect();
        assert!(!source.is_healthy());
        assert!(source.next_frame().is_err());
    }
}
