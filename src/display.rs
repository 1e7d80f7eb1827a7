//! Local display boundary.
//!
//! Presentation is an external collaborator: the pipeline only needs
//! somewhere to hand an annotated frame when streaming is disabled or has
//! degraded. A windowing backend would implement `Display`; the shipped
//! `LogDisplay` keeps headless deployments observable by logging occupancy
//! transitions instead of opening a window.

use anyhow::Result;

use crate::detect::DetectionResult;
use crate::frame::ColorFrame;

/// Sink for annotated frames on the local machine.
pub trait Display: Send {
    fn show(&mut self, frame: &ColorFrame, result: &DetectionResult) -> Result<()>;
}

/// Headless display that logs occupancy transitions.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_occupied: Option<bool>,
    frames_shown: u64,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl Display for LogDisplay {
    fn show(&mut self, frame: &ColorFrame, result: &DetectionResult) -> Result<()> {
        self.frames_shown += 1;
        if self.last_occupied != Some(result.occupied) {
            log::info!(
                "occupancy changed: occupied={} regions={} ({}x{})",
                result.occupied,
                result.regions.len(),
                frame.width(),
                frame.height()
            );
            self.last_occupied = Some(result.occupied);
        } else {
            log::trace!("frame {} occupied={}", self.frames_shown, result.occupied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_display_counts_frames() {
        let mut display = LogDisplay::new();
        let frame = ColorFrame::from_pixel(4, 4, [0, 0, 0]);
        let result = DetectionResult::default();
        display.show(&frame, &result).unwrap();
        display.show(&frame, &result).unwrap();
        assert_eq!(display.frames_shown(), 2);
    }
}
