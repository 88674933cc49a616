//! Narezka Core Library
//!
//! Core functionality for turning a long-form video into short, platform-ready
//! clips: transcript normalization, AI-driven segment discovery, parallel clip
//! cutting with ffmpeg, and platform-grouped output organization.

pub mod cache;
pub mod client;
pub mod cutter;
pub mod error;
pub mod extractor;
pub mod format;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod transcript;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use cache::{find_video_in_cache, get_cache_dir, get_root_cache_dir};
pub use client::ChatCompletionClient;
pub use cutter::{ClipCutter, CutEngine, FfmpegCutter};
pub use error::{NarezkaError, Result};
pub use extractor::{CompletionClient, Extraction, ExtractorConfig, SegmentExtractor};
pub use format::{format_artifacts_readable, format_timestamp, format_transcript_for_prompt};
pub use media::{download_video, open_media, probe_duration, sanitize_title};
pub use output::{OrganizedOutput, OutputOrganizer};
pub use pipeline::{Pipeline, PipelineConfig, Stage};
pub use provider::{Provider, ProviderConfig};
pub use transcript::{TranscriptNormalizer, TranscriptSource};
pub use types::{
    CandidateSegment, ClipArtifact, ClipStatus, MediaHandle, Platform, RunReport, RunStatus,
    TrackInfo, TranscriptLine, ValidatedSegment,
};
pub use youtube::{YtDlpTranscriptSource, extract_video_id, fetch_metadata};
