//! sentryd - occupancy monitoring daemon
//!
//! This daemon:
//! 1. Resolves configuration (file + env overrides)
//! 2. Discovers a capture device (or uses the configured one)
//! 3. Optionally connects the frame stream (single attempt, best-effort)
//! 4. Runs the capture pipeline on a supervised worker thread
//! 5. Stops cooperatively on ctrl-c, releasing device and socket

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use motion_sentry::{
    discover_devices, CameraConfig, CameraSource, CaptureLoop, CaptureWorker, FrameAnnotator,
    LogDisplay, MotionDetector, SentryConfig, StreamTransmitter, DEFAULT_DEVICE_DIR,
};

#[derive(Parser, Debug)]
#[command(
    name = "sentryd",
    about = "Occupancy monitoring daemon - adaptive motion detection with optional frame streaming"
)]
struct Args {
    /// Path to a JSON config file (falls back to the SENTRY_CONFIG env var)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture device path, overriding config and discovery
    #[arg(long)]
    device: Option<String>,

    /// List discovered capture devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentryConfig::load_from(args.config.as_deref())?;
    if let Some(device) = args.device {
        cfg.device = Some(device);
    }

    if args.list_devices {
        for device in discover_devices(Path::new(DEFAULT_DEVICE_DIR))? {
            println!("{}\t(index {})", device.path.display(), device.index);
        }
        return Ok(());
    }

    let device = resolve_device(&cfg, Path::new(DEFAULT_DEVICE_DIR))?;
    log::info!("setting up camera {}", device);

    let mut source = CameraSource::new(CameraConfig {
        device,
        target_fps: cfg.camera.target_fps,
        width: cfg.camera.width,
        height: cfg.camera.height,
    })?;
    source.connect().context("open capture device")?;

    let transmitter = if cfg.stream.enabled() {
        match StreamTransmitter::connect(&cfg.stream.host, cfg.stream.port, cfg.stream.jpeg_quality)
        {
            Ok(transmitter) => Some(transmitter),
            Err(err) => {
                log::warn!("streaming disabled for this run: {}", err);
                None
            }
        }
    } else {
        None
    };

    let detector = cfg
        .detection
        .enabled
        .then(|| MotionDetector::new(cfg.detection.delta_thresh, cfg.detection.min_area));
    if detector.is_none() {
        log::info!("motion detection disabled, annotating with static label only");
    }

    let annotator = FrameAnnotator::new(
        cfg.annotate.occupied_text.clone(),
        cfg.annotate.unoccupied_text.clone(),
    );

    let capture = CaptureLoop::new(
        source,
        detector,
        annotator,
        transmitter,
        Box::new(LogDisplay::new()),
        cfg.detection.blur_radius,
    );

    let handle = CaptureWorker::spawn(capture)?;
    let stop = handle.stop_flag();
    ctrlc::set_handler(move || {
        log::info!("stop signal received");
        stop.store(true, Ordering::SeqCst);
    })
    .context("install stop handler")?;

    // A mid-run device failure ends the loop but is absorbed here: the
    // worker has already torn down in an orderly way.
    if let Err(err) = handle.join() {
        log::error!("capture ended: {:#}", err);
    }
    Ok(())
}

/// Pick the capture device: explicit configuration wins, otherwise the
/// lowest-indexed discovered node. No devices at all is the one condition
/// that fails the whole process (exit status 1).
fn resolve_device(cfg: &SentryConfig, device_dir: &Path) -> Result<String> {
    if let Some(device) = &cfg.device {
        return Ok(device.clone());
    }
    let devices = discover_devices(device_dir)?;
    let first = devices
        .first()
        .ok_or_else(|| anyhow!("no capture devices found under {}", device_dir.display()))?;
    log::info!(
        "discovered {} capture device(s), using {}",
        devices.len(),
        first.path.display()
    );
    Ok(first.path.display().to_string())
}
