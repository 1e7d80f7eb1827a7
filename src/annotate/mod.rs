//! On-frame annotation.
//!
//! Draws the occupancy status line, a human-readable timestamp, and the
//! bounding box of every surviving region directly onto the color frame.
//! All drawing clips at the frame edges; there is no failure path.

mod font;

use chrono::{DateTime, Local};

use crate::detect::DetectionResult;
use crate::frame::ColorFrame;
use font::{glyph, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const TEXT_COLOR: [u8; 3] = [255, 0, 0];
const BOX_THICKNESS: u32 = 2;
const STATUS_SCALE: u32 = 2;
const TIMESTAMP_SCALE: u32 = 1;
const MARGIN: i64 = 10;

/// Timestamp pattern drawn at the bottom of every frame,
/// e.g. "Monday 03 August 2026 09:41:07AM".
const TIMESTAMP_FORMAT: &str = "%A %d %B %Y %I:%M:%S%p";

/// Draws occupancy state onto frames bound for the stream or local display.
#[derive(Clone, Debug)]
pub struct FrameAnnotator {
    occupied_text: String,
    unoccupied_text: String,
}

impl FrameAnnotator {
    pub fn new(occupied_text: impl Into<String>, unoccupied_text: impl Into<String>) -> Self {
        Self {
            occupied_text: occupied_text.into(),
            unoccupied_text: unoccupied_text.into(),
        }
    }

    /// Annotate `frame` in place with the cycle's detection result.
    pub fn annotate(
        &self,
        frame: &mut ColorFrame,
        result: &DetectionResult,
        timestamp: DateTime<Local>,
    ) {
        for region in &result.regions {
            draw_rect_outline(frame, region.x, region.y, region.width, region.height);
        }

        let label = if result.occupied {
            &self.occupied_text
        } else {
            &self.unoccupied_text
        };
        let status = format!("Room Status: {}", label);
        draw_text(frame, MARGIN, MARGIN, &status, STATUS_SCALE);

        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let stamp_y =
            frame.height() as i64 - MARGIN - (GLYPH_HEIGHT * TIMESTAMP_SCALE) as i64;
        draw_text(frame, MARGIN, stamp_y, &stamp, TIMESTAMP_SCALE);
    }
}

/// Hollow rectangle, `BOX_THICKNESS` pixels thick, growing outward from the
/// region bounds. Out-of-frame pixels are clipped by `put_pixel`.
fn draw_rect_outline(frame: &mut ColorFrame, x: u32, y: u32, width: u32, height: u32) {
    for t in 0..BOX_THICKNESS as i64 {
        let left = x as i64 - t;
        let top = y as i64 - t;
        let right = x as i64 + width as i64 - 1 + t;
        let bottom = y as i64 + height as i64 - 1 + t;
        for px in left..=right {
            frame.put_pixel(px, top, BOX_COLOR);
            frame.put_pixel(px, bottom, BOX_COLOR);
        }
        for py in top..=bottom {
            frame.put_pixel(left, py, BOX_COLOR);
            frame.put_pixel(right, py, BOX_COLOR);
        }
    }
}

/// Render `text` with its top-left corner at (x, y), scaling each glyph pixel
/// to a `scale` x `scale` block. Characters without a glyph advance the cursor
/// but draw nothing.
fn draw_text(frame: &mut ColorFrame, x: i64, y: i64, text: &str, scale: u32) {
    let advance = ((GLYPH_WIDTH + GLYPH_SPACING) * scale) as i64;
    let mut cursor_x = x;
    for c in text.chars() {
        if let Some(columns) = glyph(c) {
            for (col, &bits) in columns.iter().enumerate() {
                for row in 0..GLYPH_HEIGHT {
                    if (bits >> row) & 1 == 0 {
                        continue;
                    }
                    let base_x = cursor_x + (col as u32 * scale) as i64;
                    let base_y = y + (row * scale) as i64;
                    for sy in 0..scale as i64 {
                        for sx in 0..scale as i64 {
                            frame.put_pixel(base_x + sx, base_y + sy, TEXT_COLOR);
                        }
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Region;
    use chrono::TimeZone;

    fn fixed_timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 3, 9, 41, 7).unwrap()
    }

    fn count_color(frame: &ColorFrame, rgb: [u8; 3]) -> usize {
        frame
            .data()
            .chunks_exact(3)
            .filter(|px| px == &rgb)
            .count()
    }

    #[test]
    fn draws_status_text_and_timestamp() {
        let mut frame = ColorFrame::from_pixel(320, 240, [0, 0, 0]);
        let annotator = FrameAnnotator::new("Occupied", "Unoccupied");
        annotator.annotate(&mut frame, &DetectionResult::default(), fixed_timestamp());
        assert!(count_color(&frame, TEXT_COLOR) > 0);
        assert_eq!(count_color(&frame, BOX_COLOR), 0);
    }

    #[test]
    fn occupied_and_unoccupied_render_differently() {
        let annotator = FrameAnnotator::new("Occupied", "Unoccupied");

        let mut unoccupied = ColorFrame::from_pixel(320, 240, [0, 0, 0]);
        annotator.annotate(
            &mut unoccupied,
            &DetectionResult::default(),
            fixed_timestamp(),
        );

        let mut occupied = ColorFrame::from_pixel(320, 240, [0, 0, 0]);
        let result = DetectionResult {
            occupied: true,
            regions: vec![],
        };
        annotator.annotate(&mut occupied, &result, fixed_timestamp());

        assert_ne!(unoccupied, occupied);
    }

    #[test]
    fn draws_region_boxes() {
        let mut frame = ColorFrame::from_pixel(100, 100, [0, 0, 0]);
        let annotator = FrameAnnotator::new("Occupied", "Unoccupied");
        let result = DetectionResult {
            occupied: true,
            regions: vec![Region {
                x: 40,
                y: 40,
                width: 20,
                height: 10,
                area: 200,
            }],
        };
        annotator.annotate(&mut frame, &result, fixed_timestamp());
        assert!(count_color(&frame, BOX_COLOR) > 0);
        // Box interior stays untouched.
        let center = ((45 * 100) + 50) * 3;
        assert_eq!(&frame.data()[center..center + 3], &[0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_regions_are_clipped_not_fatal() {
        let mut frame = ColorFrame::from_pixel(64, 64, [0, 0, 0]);
        let annotator = FrameAnnotator::new("Occupied", "Unoccupied");
        let result = DetectionResult {
            occupied: true,
            regions: vec![Region {
                x: 60,
                y: 0,
                width: 300,
                height: 300,
                area: 1000,
            }],
        };
        annotator.annotate(&mut frame, &result, fixed_timestamp());
    }

    #[test]
    fn tiny_frames_only_get_clipped_text() {
        let mut frame = ColorFrame::from_pixel(8, 8, [0, 0, 0]);
        let annotator = FrameAnnotator::new("Occupied", "Unoccupied");
        annotator.annotate(&mut frame, &DetectionResult::default(), fixed_timestamp());
    }
}
