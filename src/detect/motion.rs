use anyhow::{anyhow, Result};

use super::regions::extract_regions;
use super::result::{DetectionResult, Region};
use crate::frame::GrayFrame;

const FOREGROUND: u8 = 255;

/// Per-frame change detector.
///
/// Stateless between frames; all temporal state lives in the background model.
#[derive(Clone, Debug)]
pub struct MotionDetector {
    delta_thresh: u8,
    min_area: u32,
    dilate_iterations: u32,
}

impl MotionDetector {
    /// Two dilation passes close small gaps in the thresholded mask, biasing
    /// toward fewer, larger regions over many noisy fragments.
    pub fn new(delta_thresh: u8, min_area: u32) -> Self {
        Self {
            delta_thresh,
            min_area,
            dilate_iterations: 2,
        }
    }

    pub fn delta_thresh(&self) -> u8 {
        self.delta_thresh
    }

    pub fn min_area(&self) -> u32 {
        self.min_area
    }

    /// Diff `current` against `reference` and report occupancy.
    ///
    /// An all-background frame is not an error: it yields `occupied = false`
    /// with an empty region list. The only failure is a dimension mismatch
    /// between the two inputs.
    pub fn detect(&self, current: &GrayFrame, reference: &GrayFrame) -> Result<DetectionResult> {
        if current.width() != reference.width() || current.height() != reference.height() {
            return Err(anyhow!(
                "frame {}x{} does not match reference {}x{}",
                current.width(),
                current.height(),
                reference.width(),
                reference.height()
            ));
        }
        let width = current.width() as usize;
        let height = current.height() as usize;

        let mut mask: Vec<u8> = current
            .data()
            .iter()
            .zip(reference.data())
            .map(|(&c, &r)| {
                if c.abs_diff(r) > self.delta_thresh {
                    FOREGROUND
                } else {
                    0
                }
            })
            .collect();

        for _ in 0..self.dilate_iterations {
            mask = dilate(&mask, width, height);
        }

        let regions: Vec<Region> = extract_regions(&mask, width, height)
            .into_iter()
            .filter(|region| region.area >= self.min_area)
            .collect();

        Ok(DetectionResult {
            occupied: !regions.is_empty(),
            regions,
        })
    }
}

/// One binary dilation pass with a full 3x3 structuring element.
fn dilate(mask: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; mask.len()];
    for y in 0..height {
        for x in 0..width {
            let mut set = false;
            'probe: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    if mask[ny as usize * width + nx as usize] != 0 {
                        set = true;
                        break 'probe;
                    }
                }
            }
            if set {
                out[y * width + x] = FOREGROUND;
            }
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat reference plus a frame with one k x k block of contrast.
    fn block_inputs(size: u32, block: u32) -> (GrayFrame, GrayFrame) {
        let reference = GrayFrame::from_pixel(size, size, 0);
        let mut data = vec![0u8; (size * size) as usize];
        let off = (size - block) / 2;
        for y in off..off + block {
            for x in off..off + block {
                data[(y * size + x) as usize] = 200;
            }
        }
        let current = GrayFrame::new(size, size, data).unwrap();
        (current, reference)
    }

    #[test]
    fn static_frame_is_unoccupied() {
        let frame = GrayFrame::from_pixel(16, 16, 120);
        let detector = MotionDetector::new(5, 10);
        let result = detector.detect(&frame, &frame).unwrap();
        assert!(!result.occupied);
        assert!(result.regions.is_empty());
    }

    #[test]
    fn detection_is_deterministic() {
        let (current, reference) = block_inputs(24, 6);
        let detector = MotionDetector::new(25, 10);
        let first = detector.detect(&current, &reference).unwrap();
        for _ in 0..5 {
            assert_eq!(detector.detect(&current, &reference).unwrap(), first);
        }
        assert!(first.occupied);
    }

    #[test]
    fn area_filter_boundary_is_inclusive() {
        // A 6x6 block dilated twice by a 3x3 element grows to 10x10 = 100
        // foreground pixels.
        let (current, reference) = block_inputs(24, 6);

        let at_threshold = MotionDetector::new(25, 100);
        let result = at_threshold.detect(&current, &reference).unwrap();
        assert!(result.occupied);
        assert_eq!(result.regions.len(), 1);
        assert_eq!(result.regions[0].area, 100);

        let above_threshold = MotionDetector::new(25, 101);
        let result = above_threshold.detect(&current, &reference).unwrap();
        assert!(!result.occupied);
        assert!(result.regions.is_empty());
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let reference = GrayFrame::from_pixel(12, 12, 100);
        let current = GrayFrame::from_pixel(12, 12, 125);
        // Difference is exactly 25 everywhere.
        let detector = MotionDetector::new(25, 1);
        assert!(!detector.detect(&current, &reference).unwrap().occupied);

        let detector = MotionDetector::new(24, 1);
        assert!(detector.detect(&current, &reference).unwrap().occupied);
    }

    #[test]
    fn bounding_box_covers_the_dilated_block() {
        let (current, reference) = block_inputs(24, 6);
        let detector = MotionDetector::new(25, 10);
        let result = detector.detect(&current, &reference).unwrap();
        let region = result.regions[0];
        // 6x6 block centered at offset 9, grown by 2 on each side.
        assert_eq!((region.x, region.y), (7, 7));
        assert_eq!((region.width, region.height), (10, 10));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let current = GrayFrame::from_pixel(8, 8, 0);
        let reference = GrayFrame::from_pixel(8, 9, 0);
        let detector = MotionDetector::new(5, 10);
        assert!(detector.detect(&current, &reference).is_err());
    }
}
