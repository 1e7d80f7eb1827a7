//! Frame containers.
//!
//! Two owned pixel buffers flow through the pipeline:
//!
//! - `ColorFrame`: 3-channel RGB frame as acquired from a source. Mutated only
//!   by the annotator, which owns the frame at that point.
//! - `GrayFrame`: single-channel luma derivative, produced per cycle and fed
//!   into the background model and motion detector.
//!
//! Grayscale conversion and blurring are integer-only so the whole detection
//! path stays deterministic for a given input sequence.

use anyhow::{anyhow, Result};

/// 3-channel RGB frame (8 bits per channel, row-major).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorFrame {
    /// Wrap an RGB24 buffer. The buffer length must be `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(anyhow!(
                "rgb buffer length {} does not match {}x{} frame (expected {})",
                data.len(),
                width,
                height,
                expected
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Solid-color frame.
    pub fn from_pixel(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Write one pixel, silently clipping out-of-bounds coordinates.
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Derive the luma plane using integer Rec.601 weights.
    pub fn to_gray(&self) -> GrayFrame {
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize);
        for rgb in self.data.chunks_exact(3) {
            let luma = (77 * rgb[0] as u32 + 150 * rgb[1] as u32 + 29 * rgb[2] as u32) >> 8;
            data.push(luma as u8);
        }
        GrayFrame {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Single-channel grayscale frame (row-major).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayFrame {
    /// Wrap a luma buffer. The buffer length must be `width * height`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "luma buffer length {} does not match {}x{} frame (expected {})",
                data.len(),
                width,
                height,
                expected
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Internal constructor for buffers whose length is correct by
    /// construction.
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Solid-value frame.
    pub fn from_pixel(width: u32, height: u32, luma: u8) -> Self {
        Self {
            width,
            height,
            data: vec![luma; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Smooth with a separable box filter of half-width `radius`.
    ///
    /// The window is clamped at the frame edges, so border pixels average over
    /// a window of the same nominal size with repeated edge samples. Radius 0
    /// returns a copy.
    pub fn box_blur(&self, radius: u32) -> GrayFrame {
        if radius == 0 || self.data.is_empty() {
            return self.clone();
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let r = radius as i64;
        let window = 2 * radius + 1;

        // Horizontal pass.
        let mut tmp = vec![0u8; w * h];
        for y in 0..h {
            let row = &self.data[y * w..(y + 1) * w];
            for x in 0..w {
                let mut sum = 0u32;
                for dx in -r..=r {
                    let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as usize;
                    sum += row[sx] as u32;
                }
                tmp[y * w + x] = (sum / window) as u8;
            }
        }

        // Vertical pass.
        let mut out = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0u32;
                for dy in -r..=r {
                    let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as usize;
                    sum += tmp[sy * w + x] as u32;
                }
                out[y * w + x] = (sum / window) as u8;
            }
        }

        GrayFrame {
            width: self.width,
            height: self.height,
            data: out,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
