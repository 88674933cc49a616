use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One caption line of the normalized transcript. Timing is carried through
/// unchanged from the source track; no re-segmentation or smoothing happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub language: String,
}

/// A caption track advertised for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub language: String,
    pub is_auto: bool,
}

/// A local media file plus its probed duration. The duration is the
/// authoritative upper bound for every segment timestamp in a run.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    pub path: PathBuf,
    pub duration: f64,
}

/// Destination platforms for short-form clips. Closed set; extend only by
/// explicit change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "YouTube_Shorts")]
    YoutubeShorts,
    #[serde(rename = "TikTok")]
    TikTok,
    #[serde(rename = "Instagram_Reels")]
    InstagramReels,
    #[serde(rename = "LinkedIn")]
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::YoutubeShorts,
        Platform::TikTok,
        Platform::InstagramReels,
        Platform::LinkedIn,
    ];

    /// Parse a platform name as the AI emits it. Unknown names yield `None`
    /// and are dropped from the segment rather than rejecting it.
    pub fn parse(name: &str) -> Option<Platform> {
        match name {
            "YouTube_Shorts" => Some(Platform::YoutubeShorts),
            "TikTok" => Some(Platform::TikTok),
            "Instagram_Reels" => Some(Platform::InstagramReels),
            "LinkedIn" => Some(Platform::LinkedIn),
            _ => None,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::YoutubeShorts => "YouTube_Shorts",
            Platform::TikTok => "TikTok",
            Platform::InstagramReels => "Instagram_Reels",
            Platform::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Raw AI-proposed segment, untrusted. `start` and `end` stay loose JSON
/// values so validation can coerce numeric strings explicitly instead of
/// trusting the model's types. Missing `start`, `end` or `title` keys fail
/// deserialization, which counts as a schema violation for the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSegment {
    #[serde(alias = "start_time")]
    pub start: serde_json::Value,
    #[serde(alias = "end_time")]
    pub end: serde_json::Value,
    #[serde(alias = "yt_title")]
    pub title: String,
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// A candidate that passed every schema and range check. Guarantees:
/// `0 <= start < end <= duration`, non-empty title and description, platforms
/// drawn from the known set, hashtags non-empty and de-duplicated.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedSegment {
    pub start: f64,
    pub end: f64,
    pub title: String,
    pub hook: String,
    pub description: String,
    pub platforms: Vec<Platform>,
    pub hashtags: Vec<String>,
}

impl ValidatedSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClipStatus {
    Cut,
    Failed,
}

/// Result of attempting to cut one validated segment. Never mutated after
/// creation; failures are recorded, not retried.
#[derive(Debug, Clone, Serialize)]
pub struct ClipArtifact {
    pub segment: ValidatedSegment,
    pub output_path: Option<PathBuf>,
    pub status: ClipStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Terminal artifact of one pipeline run: stage reached, counters, and every
/// per-item error collected along the way.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub stage: crate::pipeline::Stage,
    pub transcript_source: Option<String>,
    pub transcript_lines: usize,
    pub segments_discovered: usize,
    pub segments_validated: usize,
    pub candidates_rejected: usize,
    pub clips_cut: usize,
    pub clips_failed: usize,
    pub errors: Vec<String>,
    pub json_path: Option<PathBuf>,
    pub text_path: Option<PathBuf>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Failed,
            stage: crate::pipeline::Stage::Init,
            transcript_source: None,
            transcript_lines: 0,
            segments_discovered: 0,
            segments_validated: 0,
            candidates_rejected: 0,
            clips_cut: 0,
            clips_failed: 0,
            errors: Vec::new(),
            json_path: None,
            text_path: None,
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
