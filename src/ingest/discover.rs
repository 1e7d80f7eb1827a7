//! Capture device discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory scanned for capture device nodes.
pub const DEFAULT_DEVICE_DIR: &str = "/dev";

/// A discovered capture device node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDevice {
    pub path: PathBuf,
    pub index: u32,
}

/// Enumerate capture device nodes under `dir`.
///
/// A node matches when its file name starts with `video` and ends in a digit;
/// the trailing character is parsed as the device's numeric index. Results
/// are sorted by index. An empty result is not an error at this layer; callers
/// decide whether a deployment without devices can proceed (the daemon cannot,
/// and exits nonzero).
pub fn discover_devices(dir: &Path) -> Result<Vec<CameraDevice>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("enumerate capture devices in {}", dir.display()))?;

    let mut devices = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with("video") {
            continue;
        }
        let Some(index) = name.chars().last().and_then(|c| c.to_digit(10)) else {
            continue;
        };
        devices.push(CameraDevice {
            path: entry.path(),
            index,
        });
    }

    devices.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn finds_video_nodes_and_parses_indices() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["video0", "video2", "video1", "audio0", "null", "videoX"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let devices = discover_devices(dir.path()).unwrap();
        let indices: Vec<u32> = devices.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(devices[0].path.ends_with("video0"));
    }

    #[test]
    fn empty_directory_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let devices = discover_devices(dir.path()).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(discover_devices(Path::new("/nonexistent-device-dir")).is_err());
    }
}
