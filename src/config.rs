//! Daemon configuration.
//!
//! Resolved once at startup and immutable thereafter: a JSON config file
//! (named by `--config` or the `SENTRY_CONFIG` env var) is merged over named
//! defaults, then `SENTRY_*` env vars override individual values, then the
//! result is validated. Every recognized option has a documented default;
//! absence never leaves a field undefined.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 10;
const DEFAULT_DELTA_THRESH: u8 = 5;
const DEFAULT_MIN_AREA: u32 = 500;
const DEFAULT_BLUR_RADIUS: u32 = 10;
const DEFAULT_OCCUPIED_TEXT: &str = "Occupied";
const DEFAULT_UNOCCUPIED_TEXT: &str = "Unoccupied";
const DEFAULT_STREAM_HOST: &str = "127.0.0.1";
const DEFAULT_JPEG_QUALITY: u8 = 80;

const MAX_BLUR_RADIUS: u32 = 64;

#[derive(Debug, Deserialize, Default)]
struct SentryConfigFile {
    device: Option<String>,
    camera: Option<CameraConfigFile>,
    detection: Option<DetectionConfigFile>,
    annotate: Option<AnnotateConfigFile>,
    stream: Option<StreamConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    enabled: Option<bool>,
    delta_thresh: Option<u8>,
    min_area: Option<u32>,
    blur_radius: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnotateConfigFile {
    occupied_text: Option<String>,
    unoccupied_text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamConfigFile {
    port: Option<u16>,
    host: Option<String>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Capture device path. `None` defers to discovery.
    pub device: Option<String>,
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub annotate: AnnotateSettings,
    pub stream: StreamSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Requested capture resolution; best-effort at the device.
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// When false, frames carry the static unoccupied label only.
    pub enabled: bool,
    /// Binarization threshold for the difference image (strictly-greater).
    pub delta_thresh: u8,
    /// Minimum region pixel count to count as motion.
    pub min_area: u32,
    pub blur_radius: u32,
}

#[derive(Debug, Clone)]
pub struct AnnotateSettings {
    pub occupied_text: String,
    pub unoccupied_text: String,
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Remote consumer port; 0 disables streaming for the run.
    pub port: u16,
    pub host: String,
    pub jpeg_quality: u8,
}

impl StreamSettings {
    pub fn enabled(&self) -> bool {
        self.port != 0
    }
}

impl SentryConfig {
    /// Load from `SENTRY_CONFIG` (if set) plus env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTRY_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file path, falling back to `SENTRY_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("SENTRY_CONFIG").ok();
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => match env_path.as_deref() {
                Some(path) => Some(read_config_file(Path::new(path))?),
                None => None,
            },
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentryConfigFile) -> Self {
        let camera = CameraSettings {
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_HEIGHT),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_FPS),
        };
        let detection = DetectionSettings {
            enabled: file
                .detection
                .as_ref()
                .and_then(|detection| detection.enabled)
                .unwrap_or(true),
            delta_thresh: file
                .detection
                .as_ref()
                .and_then(|detection| detection.delta_thresh)
                .unwrap_or(DEFAULT_DELTA_THRESH),
            min_area: file
                .detection
                .as_ref()
                .and_then(|detection| detection.min_area)
                .unwrap_or(DEFAULT_MIN_AREA),
            blur_radius: file
                .detection
                .as_ref()
                .and_then(|detection| detection.blur_radius)
                .unwrap_or(DEFAULT_BLUR_RADIUS),
        };
        let annotate = AnnotateSettings {
            occupied_text: file
                .annotate
                .as_ref()
                .and_then(|annotate| annotate.occupied_text.clone())
                .unwrap_or_else(|| DEFAULT_OCCUPIED_TEXT.to_string()),
            unoccupied_text: file
                .annotate
                .as_ref()
                .and_then(|annotate| annotate.unoccupied_text.clone())
                .unwrap_or_else(|| DEFAULT_UNOCCUPIED_TEXT.to_string()),
        };
        let stream = StreamSettings {
            port: file.stream.as_ref().and_then(|stream| stream.port).unwrap_or(0),
            host: file
                .stream
                .as_ref()
                .and_then(|stream| stream.host.clone())
                .unwrap_or_else(|| DEFAULT_STREAM_HOST.to_string()),
            jpeg_quality: file
                .stream
                .as_ref()
                .and_then(|stream| stream.jpeg_quality)
                .unwrap_or(DEFAULT_JPEG_QUALITY),
        };
        Self {
            device: file.device,
            camera,
            detection,
            annotate,
            stream,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("SENTRY_DEVICE") {
            if !device.trim().is_empty() {
                self.device = Some(device);
            }
        }
        if let Ok(enabled) = std::env::var("SENTRY_MOTION_DETECTION") {
            self.detection.enabled = parse_bool("SENTRY_MOTION_DETECTION", &enabled)?;
        }
        if let Ok(thresh) = std::env::var("SENTRY_DELTA_THRESH") {
            self.detection.delta_thresh = thresh
                .parse()
                .map_err(|_| anyhow!("SENTRY_DELTA_THRESH must be an integer in 1..=255"))?;
        }
        if let Ok(area) = std::env::var("SENTRY_MIN_AREA") {
            self.detection.min_area = area
                .parse()
                .map_err(|_| anyhow!("SENTRY_MIN_AREA must be a positive integer"))?;
        }
        if let Ok(port) = std::env::var("SENTRY_STREAM_PORT") {
            self.stream.port = port
                .parse()
                .map_err(|_| anyhow!("SENTRY_STREAM_PORT must be a port number (0 disables)"))?;
        }
        if let Ok(host) = std::env::var("SENTRY_STREAM_HOST") {
            if !host.trim().is_empty() {
                self.stream.host = host;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("capture resolution must be nonzero"));
        }
        if self.detection.delta_thresh == 0 {
            return Err(anyhow!("delta_thresh must be in 1..=255"));
        }
        if self.detection.min_area == 0 {
            return Err(anyhow!("min_area must be greater than zero"));
        }
        if self.detection.blur_radius > MAX_BLUR_RADIUS {
            return Err(anyhow!("blur_radius must be at most {}", MAX_BLUR_RADIUS));
        }
        if self.stream.jpeg_quality == 0 || self.stream.jpeg_quality > 100 {
            return Err(anyhow!("jpeg_quality must be in 1..=100"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SentryConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(anyhow!("{} must be a boolean (true/false)", name)),
    }
}
