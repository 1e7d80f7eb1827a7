//! Motion detection against the adaptive background reference.
//!
//! The detector is pure computation: given the current blurred luma frame and
//! the background reference for the same cycle, it produces a binary change
//! mask, merges fragmented foreground with dilation, extracts connected
//! regions, and filters them by area. Identical inputs always produce
//! identical results.

mod motion;
mod regions;
mod result;

pub use motion::MotionDetector;
pub use result::{DetectionResult, Region};
