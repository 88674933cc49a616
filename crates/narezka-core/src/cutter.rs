use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::{process::Command, sync::Semaphore};
use tracing::{info, warn};

use crate::error::{NarezkaError, Result};
use crate::types::{ClipArtifact, ClipStatus, MediaHandle, ValidatedSegment};

/// The low-level media cutting primitive: given a source file and a time
/// range, produce a sub-clip at `output`.
#[async_trait]
pub trait CutEngine: Send + Sync {
    async fn cut(&self, source: &Path, start: f64, end: f64, output: &Path) -> Result<()>;
}

/// Cuts sub-clips with ffmpeg, re-encoding so the cut lands exactly on the
/// requested boundaries.
pub struct FfmpegCutter;

#[async_trait]
impl CutEngine for FfmpegCutter {
    async fn cut(&self, source: &Path, start: f64, end: f64, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .arg("-i")
            .arg(source)
            .arg("-ss")
            .arg(start.to_string())
            .arg("-to")
            .arg(end.to_string())
            .arg("-c:v")
            .arg("libx264")
            .arg("-preset")
            .arg("slow")
            .arg("-crf")
            .arg("18")
            .arg("-c:a")
            .arg("aac")
            .arg("-b:a")
            .arg("192k")
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            // don't leave a partial file behind
            let _ = tokio::fs::remove_file(output).await;
            return Err(NarezkaError::CutFailed {
                output: output.to_path_buf(),
                reason: String::from_utf8_lossy(&result.stderr).to_string(),
            });
        }

        Ok(())
    }
}

/// Cuts one clip per validated segment on a bounded worker pool. Each
/// segment's cut is independent: a failure is recorded on its artifact and
/// never aborts the batch.
pub struct ClipCutter {
    engine: Arc<dyn CutEngine>,
    jobs: usize,
}

impl ClipCutter {
    pub fn new(engine: Arc<dyn CutEngine>, jobs: usize) -> Self {
        Self {
            engine,
            jobs: jobs.max(1),
        }
    }

    /// Produces exactly one artifact per segment, in segment order.
    pub async fn cut_all(
        &self,
        media: &MediaHandle,
        segments: &[ValidatedSegment],
        out_dir: &Path,
        stem: &str,
    ) -> Result<Vec<ClipArtifact>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }
        tokio::fs::create_dir_all(out_dir).await?;

        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let tasks = segments.iter().cloned().enumerate().map(|(index, segment)| {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let source = media.path.clone();
            let output = out_dir.join(clip_file_name(stem, index, &segment.title));

            async move {
                let _permit = semaphore.acquire().await.ok();
                let artifact = match engine.cut(&source, segment.start, segment.end, &output).await
                {
                    Ok(()) => {
                        info!(clip = %output.display(), "clip cut");
                        ClipArtifact {
                            segment,
                            output_path: Some(output),
                            status: ClipStatus::Cut,
                            error: None,
                        }
                    }
                    Err(err) => {
                        warn!(clip = %output.display(), %err, "clip cut failed");
                        ClipArtifact {
                            segment,
                            output_path: None,
                            status: ClipStatus::Failed,
                            error: Some(err.to_string()),
                        }
                    }
                };
                (index, artifact)
            }
        });

        // Completion order is irrelevant; artifacts go back in segment order
        // for deterministic downstream output.
        let mut indexed = join_all(tasks).await;
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, artifact)| artifact).collect())
    }
}

/// Deterministic, collision-free output name: the index prefix keeps clips of
/// identically-titled segments apart.
pub fn clip_file_name(stem: &str, index: usize, title: &str) -> String {
    let slug: String = crate::media::sanitize_title(title).chars().take(48).collect();
    let slug = if slug == "video" { "clip".to_string() } else { slug };
    format!("{stem}_{:02}_{slug}.mp4", index + 1)
}
