use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{NarezkaError, Result};
use crate::types::{TrackInfo, TranscriptLine};

/// Read-only access to a video's caption tracks. Implemented for the YouTube
/// timedtext backend in [`crate::youtube`] and by mocks in tests.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TrackInfo>>;

    async fn fetch_track(
        &self,
        video_id: &str,
        language: &str,
        auto: bool,
    ) -> Result<Vec<TranscriptLine>>;

    async fn translate_track(
        &self,
        video_id: &str,
        language: &str,
        auto: bool,
        target: &str,
    ) -> Result<Vec<TranscriptLine>>;
}

/// One time-ordered transcript in a single language, plus where it came from.
#[derive(Debug, Clone)]
pub struct NormalizedTranscript {
    pub lines: Vec<TranscriptLine>,
    pub source: String,
}

/// Merges raw caption tracks into one transcript in the target language.
///
/// Fallback chain: manual track in the target language, then an auto-generated
/// one, then any manual track translated, then any auto track translated.
/// Per-line timing passes through untouched.
pub struct TranscriptNormalizer {
    target_lang: String,
}

fn lang_matches(code: &str, target: &str) -> bool {
    code == target || code.starts_with(&format!("{target}-"))
}

impl TranscriptNormalizer {
    pub fn new(target_lang: impl Into<String>) -> Self {
        Self {
            target_lang: target_lang.into(),
        }
    }

    pub async fn normalize(
        &self,
        source: &dyn TranscriptSource,
        video_id: &str,
    ) -> Result<NormalizedTranscript> {
        let tracks = source.list_tracks(video_id).await?;
        if tracks.is_empty() {
            return Err(NarezkaError::NoTranscriptAvailable {
                video_id: video_id.to_string(),
            });
        }

        let target = self.target_lang.as_str();
        let in_target = |track: &&TrackInfo| lang_matches(&track.language, target);

        // Tracks already in the target language, manual before auto-generated.
        let mut candidates: Vec<&TrackInfo> = Vec::new();
        candidates.extend(tracks.iter().filter(|t| !t.is_auto).filter(in_target));
        candidates.extend(tracks.iter().filter(|t| t.is_auto).filter(in_target));

        for track in candidates {
            match source.fetch_track(video_id, &track.language, track.is_auto).await {
                Ok(lines) if !lines.is_empty() => {
                    let kind = if track.is_auto { "auto" } else { "manual" };
                    info!(language = %track.language, kind, lines = lines.len(), "transcript track selected");
                    return Ok(NormalizedTranscript {
                        lines,
                        source: format!("{} ({kind})", track.language),
                    });
                }
                Ok(_) => warn!(language = %track.language, "caption track was empty, trying next"),
                Err(err) => warn!(language = %track.language, %err, "caption track fetch failed, trying next"),
            }
        }

        // Nothing usable in the target language: translate, manual tracks first.
        let mut translatable: Vec<&TrackInfo> = Vec::new();
        translatable.extend(tracks.iter().filter(|t| !t.is_auto && !lang_matches(&t.language, target)));
        translatable.extend(tracks.iter().filter(|t| t.is_auto && !lang_matches(&t.language, target)));

        for track in translatable {
            match source
                .translate_track(video_id, &track.language, track.is_auto, target)
                .await
            {
                Ok(lines) if !lines.is_empty() => {
                    let kind = if track.is_auto { "auto" } else { "manual" };
                    info!(language = %track.language, kind, target, "translated caption track selected");
                    return Ok(NormalizedTranscript {
                        lines,
                        source: format!("{} ({kind}, translated to {target})", track.language),
                    });
                }
                Ok(_) => warn!(language = %track.language, "translated track was empty, trying next"),
                Err(err) => warn!(language = %track.language, %err, "translation failed, trying next"),
            }
        }

        Err(NarezkaError::NoTranscriptAvailable {
            video_id: video_id.to_string(),
        })
    }
}
