use std::sync::Mutex;

use tempfile::NamedTempFile;

use motion_sentry::config::SentryConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTRY_CONFIG",
        "SENTRY_DEVICE",
        "SENTRY_MOTION_DETECTION",
        "SENTRY_DELTA_THRESH",
        "SENTRY_MIN_AREA",
        "SENTRY_STREAM_PORT",
        "SENTRY_STREAM_HOST",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "device": "/dev/video2",
        "camera": {
            "width": 800,
            "height": 600,
            "target_fps": 12
        },
        "detection": {
            "delta_thresh": 9,
            "min_area": 750,
            "blur_radius": 6
        },
        "annotate": {
            "occupied_text": "Motion",
            "unoccupied_text": "Clear"
        },
        "stream": {
            "port": 4545,
            "host": "10.0.0.7",
            "jpeg_quality": 65
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SENTRY_CONFIG", file.path());
    std::env::set_var("SENTRY_MIN_AREA", "1200");
    std::env::set_var("SENTRY_STREAM_PORT", "6000");

    let cfg = SentryConfig::load().expect("load config");

    assert_eq!(cfg.device.as_deref(), Some("/dev/video2"));
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.camera.target_fps, 12);
    assert!(cfg.detection.enabled);
    assert_eq!(cfg.detection.delta_thresh, 9);
    assert_eq!(cfg.detection.min_area, 1200);
    assert_eq!(cfg.detection.blur_radius, 6);
    assert_eq!(cfg.annotate.occupied_text, "Motion");
    assert_eq!(cfg.annotate.unoccupied_text, "Clear");
    assert_eq!(cfg.stream.port, 6000);
    assert!(cfg.stream.enabled());
    assert_eq!(cfg.stream.host, "10.0.0.7");
    assert_eq!(cfg.stream.jpeg_quality, 65);

    clear_env();
}

#[test]
fn absent_file_resolves_to_named_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentryConfig::load().expect("load config");

    assert!(cfg.device.is_none());
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
    assert!(cfg.detection.enabled);
    assert_eq!(cfg.detection.delta_thresh, 5);
    assert_eq!(cfg.detection.min_area, 500);
    assert_eq!(cfg.stream.port, 0);
    assert!(!cfg.stream.enabled());

    clear_env();
}

#[test]
fn env_can_disable_motion_detection() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTRY_MOTION_DETECTION", "off");
    let cfg = SentryConfig::load().expect("load config");
    assert!(!cfg.detection.enabled);

    clear_env();
}

#[test]
fn invalid_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTRY_DELTA_THRESH", "enormous");
    assert!(SentryConfig::load().is_err());
    clear_env();

    std::env::set_var("SENTRY_DELTA_THRESH", "0");
    assert!(SentryConfig::load().is_err());
    clear_env();
}

#[test]
fn malformed_config_file_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("SENTRY_CONFIG", file.path());

    assert!(SentryConfig::load().is_err());

    clear_env();
}
