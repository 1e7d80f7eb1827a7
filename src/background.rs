//! Adaptive background model.
//!
//! The model is an exponential moving average over the blurred luma plane.
//! Each cycle blends the incoming frame into the accumulator with a fixed
//! smoothing factor, which tracks slow illumination drift while suppressing
//! transient motion. The accumulator is blended BEFORE the frame's own
//! detection pass, so every frame is diffed against a reference that already
//! includes it.
//!
//! There is no reset operation; the model lives for the capture session.

use anyhow::{anyhow, Result};

use crate::frame::GrayFrame;

/// Default smoothing factor. Small enough to favor stability over adaptation
/// speed; the model still converges to a changed static scene within tens of
/// frames.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Running EMA estimate of the static scene.
#[derive(Clone, Debug)]
pub struct BackgroundModel {
    accum: Vec<f32>,
    width: u32,
    height: u32,
    alpha: f32,
}

impl BackgroundModel {
    /// Seed the model from the first observed (grayscale, blurred) frame.
    ///
    /// Called exactly once, on the warmup cycle; no detection runs against a
    /// model that has only seen its seed frame.
    pub fn initialize(frame: &GrayFrame, alpha: f32) -> Self {
        Self {
            accum: frame.data().iter().map(|&p| p as f32).collect(),
            width: frame.width(),
            height: frame.height(),
            alpha,
        }
    }

    /// Blend `frame` into the running average and return the updated
    /// reference image for this cycle's diff.
    pub fn update(&mut self, frame: &GrayFrame) -> Result<GrayFrame> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(anyhow!(
                "frame {}x{} does not match background model {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            ));
        }
        for (acc, &p) in self.accum.iter_mut().zip(frame.data()) {
            *acc = (1.0 - self.alpha) * *acc + self.alpha * p as f32;
        }
        Ok(self.reference())
    }

    /// Current reference image, rounded to the nearest 8-bit value.
    pub fn reference(&self) -> GrayFrame {
        let data = self
            .accum
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayFrame::from_raw(self.width, self.height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
