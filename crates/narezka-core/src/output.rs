use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::format::format_artifacts_readable;
use crate::types::{ClipArtifact, ClipStatus, Platform};

/// Persisted views of one run: the structured record, the human-readable
/// record, and the per-platform clip placements.
#[derive(Debug)]
pub struct OrganizedOutput {
    pub json_path: PathBuf,
    pub text_path: PathBuf,
    pub placements: BTreeMap<Platform, Vec<PathBuf>>,
}

// Field order here is the persisted field order; keep it fixed so re-runs
// produce byte-identical JSON.
#[derive(Serialize)]
struct SegmentRecord<'a> {
    start: f64,
    end: f64,
    title: &'a str,
    hook: &'a str,
    description: &'a str,
    platforms: &'a [Platform],
    hashtags: &'a [String],
    output_path: Option<&'a Path>,
    status: ClipStatus,
}

#[derive(Serialize)]
struct RunRecord<'a> {
    video_title: &'a str,
    total_segments: usize,
    segments: Vec<SegmentRecord<'a>>,
}

/// Groups cut clips by platform and persists the run's metadata records.
/// Failed artifacts appear in both records with their failure noted, but in
/// no platform grouping. Re-running against the same artifacts is idempotent.
pub struct OutputOrganizer {
    base_dir: PathBuf,
}

impl OutputOrganizer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub async fn organize(
        &self,
        video_title: &str,
        artifacts: &[ClipArtifact],
    ) -> Result<OrganizedOutput> {
        self.create_directories().await?;

        let mut placements: BTreeMap<Platform, Vec<PathBuf>> = Platform::ALL
            .iter()
            .map(|platform| (*platform, Vec::new()))
            .collect();

        for artifact in artifacts {
            let (ClipStatus::Cut, Some(clip_path)) = (artifact.status, artifact.output_path.as_deref())
            else {
                continue;
            };
            for platform in &artifact.segment.platforms {
                match self.place_clip(*platform, clip_path).await {
                    Ok(placed) => {
                        if let Some(paths) = placements.get_mut(platform) {
                            paths.push(placed);
                        }
                    }
                    // item-level: the record still lists the clip
                    Err(err) => warn!(%platform, clip = %clip_path.display(), %err, "could not place clip"),
                }
            }
        }

        let json_path = self.write_json(video_title, artifacts).await?;
        let text_path = self.write_readable(video_title, artifacts).await?;
        info!(json = %json_path.display(), text = %text_path.display(), "run metadata persisted");

        Ok(OrganizedOutput {
            json_path,
            text_path,
            placements,
        })
    }

    async fn create_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir).await?;
        for platform in Platform::ALL {
            fs::create_dir_all(self.base_dir.join(platform.dir_name())).await?;
        }
        Ok(())
    }

    /// Reference the clip from a platform directory: relative symlink where
    /// the filesystem allows it, copy otherwise. An existing entry is left in
    /// place so re-runs converge on the same set.
    async fn place_clip(&self, platform: Platform, clip_path: &Path) -> Result<PathBuf> {
        let file_name = clip_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "clip.mp4".into());
        let target = self.base_dir.join(platform.dir_name()).join(&file_name);

        if fs::symlink_metadata(&target).await.is_ok() {
            debug!(target = %target.display(), "clip already placed");
            return Ok(target);
        }

        #[cfg(unix)]
        {
            let relative = Path::new("..").join(&file_name);
            if fs::symlink(&relative, &target).await.is_ok() {
                return Ok(target);
            }
        }
        fs::copy(clip_path, &target).await?;
        Ok(target)
    }

    async fn write_json(&self, video_title: &str, artifacts: &[ClipArtifact]) -> Result<PathBuf> {
        let record = RunRecord {
            video_title,
            total_segments: artifacts.len(),
            segments: artifacts
                .iter()
                .map(|artifact| SegmentRecord {
                    start: artifact.segment.start,
                    end: artifact.segment.end,
                    title: &artifact.segment.title,
                    hook: &artifact.segment.hook,
                    description: &artifact.segment.description,
                    platforms: &artifact.segment.platforms,
                    hashtags: &artifact.segment.hashtags,
                    output_path: artifact.output_path.as_deref(),
                    status: artifact.status,
                })
                .collect(),
        };

        let path = self.base_dir.join(format!("{video_title}_segments.json"));
        let pretty_json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, &pretty_json).await?;
        Ok(path)
    }

    async fn write_readable(&self, video_title: &str, artifacts: &[ClipArtifact]) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("{video_title}_segments.txt"));
        fs::write(&path, format_artifacts_readable(video_title, artifacts)).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidatedSegment;

    async fn artifact(
        dir: &Path,
        name: &str,
        platforms: Vec<Platform>,
        status: ClipStatus,
    ) -> ClipArtifact {
        let output_path = if status == ClipStatus::Cut {
            let path = dir.join(name);
            fs::write(&path, b"clip").await.unwrap();
            Some(path)
        } else {
            None
        };
        ClipArtifact {
            segment: ValidatedSegment {
                start: 1.0,
                end: 9.0,
                title: name.trim_end_matches(".mp4").to_string(),
                hook: "watch this".to_string(),
                description: "a clip".to_string(),
                platforms,
                hashtags: vec!["#clip".to_string()],
            },
            output_path,
            status,
            error: (status == ClipStatus::Failed).then(|| "cut error".to_string()),
        }
    }

    #[tokio::test]
    async fn failed_artifacts_are_recorded_but_not_grouped() {
        let dir = tempfile::tempdir().unwrap();
        let organizer = OutputOrganizer::new(dir.path());
        let artifacts = vec![
            artifact(dir.path(), "a.mp4", vec![Platform::TikTok], ClipStatus::Cut).await,
            artifact(dir.path(), "b.mp4", vec![Platform::TikTok], ClipStatus::Failed).await,
        ];

        let output = organizer.organize("Demo", &artifacts).await.unwrap();
        assert_eq!(output.placements[&Platform::TikTok].len(), 1);
        assert!(output.placements[&Platform::LinkedIn].is_empty());

        let json = fs::read_to_string(&output.json_path).await.unwrap();
        assert!(json.contains("\"Failed\""));
        let text = fs::read_to_string(&output.text_path).await.unwrap();
        assert!(text.contains("Status: Failed (cut error)"));
    }

    #[tokio::test]
    async fn clips_land_in_every_listed_platform_directory() {
        let dir = tempfile::tempdir().unwrap();
        let organizer = OutputOrganizer::new(dir.path());
        let artifacts = vec![
            artifact(
                dir.path(),
                "a.mp4",
                vec![Platform::TikTok, Platform::YoutubeShorts],
                ClipStatus::Cut,
            )
            .await,
        ];

        let output = organizer.organize("Demo", &artifacts).await.unwrap();
        assert_eq!(output.placements[&Platform::TikTok].len(), 1);
        assert_eq!(output.placements[&Platform::YoutubeShorts].len(), 1);
        assert!(fs::symlink_metadata(dir.path().join("TikTok").join("a.mp4"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn organizing_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let organizer = OutputOrganizer::new(dir.path());
        let artifacts = vec![
            artifact(dir.path(), "a.mp4", vec![Platform::TikTok], ClipStatus::Cut).await,
            artifact(dir.path(), "b.mp4", vec![Platform::LinkedIn], ClipStatus::Cut).await,
        ];

        let first = organizer.organize("Demo", &artifacts).await.unwrap();
        let first_json = fs::read(&first.json_path).await.unwrap();
        let second = organizer.organize("Demo", &artifacts).await.unwrap();
        let second_json = fs::read(&second.json_path).await.unwrap();

        assert_eq!(first_json, second_json);
        assert_eq!(
            first.placements[&Platform::TikTok],
            second.placements[&Platform::TikTok]
        );
    }
}
