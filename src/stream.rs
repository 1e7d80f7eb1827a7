//! Length-prefixed frame streaming.
//!
//! Wire format, per frame, over one long-lived TCP connection:
//!
//! ```text
//! [8 bytes: big-endian unsigned payload length N][N bytes: JPEG payload]
//! ```
//!
//! No acknowledgements, no sequence numbers, no heartbeat. The stream is
//! best-effort telemetry: the connection is attempted exactly once at
//! startup, and the first failed send permanently degrades the session to a
//! no-op. The capture loop observes the degrade and falls back to the local
//! display for the rest of the run.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

use crate::frame::ColorFrame;

/// Streaming failures, split so callers can tell a dead-on-arrival channel
/// from one that died mid-run.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The single startup connection attempt failed; streaming is disabled
    /// for the whole run.
    #[error("stream connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// A send failed mid-run; the session is degraded for the rest of the run.
    #[error("stream write failed after {frames_sent} frames: {source}")]
    Write {
        frames_sent: u64,
        #[source]
        source: io::Error,
    },
    /// JPEG encoding failed; treated like a write failure by the session.
    #[error("frame encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// One-shot streaming session to a remote frame consumer.
#[derive(Debug)]
pub struct StreamTransmitter {
    stream: TcpStream,
    peer: String,
    connected: bool,
    jpeg_quality: u8,
    frames_sent: u64,
}

impl StreamTransmitter {
    /// Single connection attempt. There is no retry; a failure here means the
    /// run continues without streaming.
    pub fn connect(host: &str, port: u16, jpeg_quality: u8) -> Result<Self, StreamError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).map_err(|source| StreamError::Connect {
            addr: addr.clone(),
            source,
        })?;
        log::info!("streaming connected to {}", addr);
        Ok(Self {
            stream,
            peer: addr,
            connected: true,
            jpeg_quality,
            frames_sent: 0,
        })
    }

    /// Encode and transmit one frame.
    ///
    /// Returns `Ok(true)` when the frame was written, `Ok(false)` when the
    /// session is already degraded (the call is a no-op). Any error flips the
    /// session to degraded permanently; there is no reconnect or retry.
    pub fn send(&mut self, frame: &ColorFrame) -> Result<bool, StreamError> {
        if !self.connected {
            return Ok(false);
        }

        let payload = match encode_jpeg(frame, self.jpeg_quality) {
            Ok(payload) => payload,
            Err(err) => {
                self.connected = false;
                return Err(err);
            }
        };

        let header = (payload.len() as u64).to_be_bytes();
        let written = self
            .stream
            .write_all(&header)
            .and_then(|_| self.stream.write_all(&payload))
            .and_then(|_| self.stream.flush());
        if let Err(source) = written {
            self.connected = false;
            return Err(StreamError::Write {
                frames_sent: self.frames_sent,
                source,
            });
        }

        self.frames_sent += 1;
        Ok(true)
    }

    /// False once the session has degraded; `send` is a no-op from then on.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Close the socket. Safe to call on an already-degraded session.
    pub fn shutdown(&mut self) {
        self.connected = false;
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for StreamTransmitter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn encode_jpeg(frame: &ColorFrame, quality: u8) -> Result<Vec<u8>, StreamError> {
    let mut payload = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut payload, quality);
    encoder.encode(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(payload)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
