use crate::catalog::{Ad, AdKind, DEFAULT_AD_DURATION_SECS};
use std::path::Path;
use std::process::Command;

/// Probe a media file's playable duration in seconds via ffprobe.
///
/// Returns `None` when ffprobe is unavailable, exits nonzero, or
/// prints something unparseable; callers substitute a default.
pub fn media_duration_secs(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output();

    let output = match output {
        Ok(out) => out,
        Err(e) => {
            log::warn!("ffprobe failed to start for {}: {}", path.display(), e);
            return None;
        }
    };
    if !output.status.success() {
        log::warn!("ffprobe failed on {}: {}", path.display(), output.status);
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

/// Resolve the duration an ad will occupy on screen.
///
/// Images use their stored duration; videos are probed from the media
/// file, falling back to the 5-second default when probing fails.
pub fn planned_duration_secs(ad: &Ad, ads_dir: &Path) -> f64 {
    match ad.kind {
        AdKind::Image { duration } => duration,
        AdKind::Video => {
            media_duration_secs(&ads_dir.join(&ad.filename)).unwrap_or(DEFAULT_AD_DURATION_SECS)
        }
    }
}
