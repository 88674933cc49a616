use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::error::{NarezkaError, Result};
use crate::types::MediaHandle;

/// Download a video from URL using yt-dlp
pub async fn download_video(url: &str, cache_dir: &Path) -> Result<PathBuf> {
    let output_template = cache_dir.join("video.%(ext)s");
    let output = Command::new("yt-dlp")
        .arg(url)
        .arg("--print")
        .arg("after_move:filepath")
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("-f")
        .arg("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        .arg("-o")
        .arg(&output_template)
        .output()
        .await?;

    if !output.status.success() {
        return Err(NarezkaError::DownloadFailed {
            url: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout_str = String::from_utf8_lossy(output.stdout.as_slice());
    let filepath = PathBuf::from(stdout_str.trim());
    info!(path = %filepath.display(), "video downloaded");
    Ok(filepath)
}

/// Probe the media duration in seconds with ffprobe. This is the authoritative
/// upper bound every segment timestamp is checked against.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(NarezkaError::ProbeFailed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout_str = String::from_utf8_lossy(output.stdout.as_slice());
    stdout_str
        .trim()
        .parse::<f64>()
        .map_err(|e| NarezkaError::ProbeFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Open a local media file, probing its duration.
pub async fn open_media(path: PathBuf) -> Result<MediaHandle> {
    let duration = probe_duration(&path).await?;
    Ok(MediaHandle { path, duration })
}

/// Reduce a video title to a filesystem-safe name.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}
