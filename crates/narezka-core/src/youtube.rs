use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{NarezkaError, Result};
use crate::transcript::TranscriptSource;
use crate::types::{TrackInfo, TranscriptLine};

/// Extract the video ID from the common YouTube URL shapes, or accept a bare
/// 11-character ID.
pub fn extract_video_id(url: &str) -> Option<String> {
    fn is_id_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    }

    fn take_id(rest: &str) -> Option<String> {
        let id: String = rest.chars().take_while(|c| is_id_char(*c)).collect();
        (id.len() == 11).then_some(id)
    }

    for marker in ["watch?v=", "youtu.be/", "/shorts/"] {
        if let Some(pos) = url.find(marker) {
            return take_id(&url[pos + marker.len()..]);
        }
    }

    if url.len() == 11 && url.chars().all(is_id_char) {
        return Some(url.to_string());
    }
    None
}

/// The slice of yt-dlp's `--dump-json` output the pipeline cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitles: HashMap<String, Vec<CaptionFormat>>,
    #[serde(default)]
    pub automatic_captions: HashMap<String, Vec<CaptionFormat>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionFormat {
    pub url: String,
    #[serde(default)]
    pub ext: Option<String>,
}

/// Fetch video metadata (title plus advertised caption tracks) with yt-dlp.
pub async fn fetch_metadata(video_id: &str) -> Result<VideoMetadata> {
    let url = format!("https://www.youtube.com/watch?v={video_id}");
    let output = Command::new("yt-dlp")
        .arg(&url)
        .arg("--skip-download")
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--dump-json")
        .output()
        .await?;

    if !output.status.success() {
        return Err(NarezkaError::DownloadFailed {
            url,
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let metadata: VideoMetadata = serde_json::from_slice(&output.stdout)?;
    Ok(metadata)
}

/// Caption source backed by yt-dlp metadata and YouTube's timedtext endpoint.
/// Tracks under `subtitles` are manually created, tracks under
/// `automatic_captions` are generated; translation appends `tlang` to the
/// track URL the way the timedtext API expects.
pub struct YtDlpTranscriptSource {
    metadata: VideoMetadata,
    http: reqwest::Client,
}

impl YtDlpTranscriptSource {
    pub fn new(metadata: VideoMetadata) -> Self {
        Self {
            metadata,
            http: reqwest::Client::new(),
        }
    }

    fn track_url(&self, language: &str, auto: bool) -> Result<String> {
        let tracks = if auto {
            &self.metadata.automatic_captions
        } else {
            &self.metadata.subtitles
        };
        let formats = tracks.get(language).ok_or_else(|| NarezkaError::TrackFetchFailed {
            language: language.to_string(),
            reason: "track not advertised".to_string(),
        })?;

        if let Some(json3) = formats.iter().find(|f| f.ext.as_deref() == Some("json3")) {
            return Ok(json3.url.clone());
        }
        // The timedtext endpoint re-serializes on request; force the format
        // we can parse.
        formats
            .first()
            .map(|f| format!("{}&fmt=json3", f.url))
            .ok_or_else(|| NarezkaError::TrackFetchFailed {
                language: language.to_string(),
                reason: "track has no formats".to_string(),
            })
    }

    async fn download_track(&self, url: &str, language: &str) -> Result<Vec<TranscriptLine>> {
        debug!(language, "downloading caption track");
        let body = self.http.get(url).send().await?.text().await?;
        parse_json3(&body, language)
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    async fn list_tracks(&self, _video_id: &str) -> Result<Vec<TrackInfo>> {
        let mut tracks = Vec::new();
        for (language, formats) in &self.metadata.subtitles {
            if language != "live_chat" && !formats.is_empty() {
                tracks.push(TrackInfo {
                    language: language.clone(),
                    is_auto: false,
                });
            }
        }
        for (language, formats) in &self.metadata.automatic_captions {
            if language != "live_chat" && !formats.is_empty() {
                tracks.push(TrackInfo {
                    language: language.clone(),
                    is_auto: true,
                });
            }
        }
        Ok(tracks)
    }

    async fn fetch_track(
        &self,
        _video_id: &str,
        language: &str,
        auto: bool,
    ) -> Result<Vec<TranscriptLine>> {
        let url = self.track_url(language, auto)?;
        self.download_track(&url, language).await
    }

    async fn translate_track(
        &self,
        _video_id: &str,
        language: &str,
        auto: bool,
        target: &str,
    ) -> Result<Vec<TranscriptLine>> {
        let url = format!("{}&tlang={target}", self.track_url(language, auto)?);
        self.download_track(&url, target).await
    }
}

#[derive(Deserialize)]
struct Json3Body {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    t_start_ms: Option<i64>,
    #[serde(rename = "dDurMs", default)]
    d_dur_ms: Option<i64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

fn parse_json3(body: &str, language: &str) -> Result<Vec<TranscriptLine>> {
    let parsed: Json3Body = serde_json::from_str(body)?;
    let mut lines = Vec::new();

    for event in parsed.events {
        let Some(start_ms) = event.t_start_ms else {
            continue;
        };
        let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
        let text = text.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let start = start_ms as f64 / 1000.0;
        let end = start + event.d_dur_ms.unwrap_or(0) as f64 / 1000.0;
        lines.push(TranscriptLine {
            start,
            end,
            text,
            language: language.to_string(),
        });
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s",
            "https://youtu.be/dQw4w9WgXcQ?si=xyz",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn rejects_urls_without_a_valid_id() {
        assert_eq!(extract_video_id("https://example.com/video"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("definitely not an id"), None);
    }

    #[test]
    fn parses_timedtext_events() {
        let body = r#"{"events":[
            {"tStartMs":0,"dDurMs":5000,"segs":[{"utf8":"intro"}]},
            {"tStartMs":5000,"dDurMs":25000,"segs":[{"utf8":"sto"},{"utf8":"ry"}]},
            {"tStartMs":31000}
        ]}"#;
        let lines = parse_json3(body, "en").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "intro");
        assert_eq!(lines[1].text, "story");
        assert_eq!(lines[1].start, 5.0);
        assert_eq!(lines[1].end, 30.0);
        assert_eq!(lines[1].language, "en");
    }

    #[test]
    fn empty_and_whitespace_events_are_skipped() {
        let body = r#"{"events":[{"tStartMs":0,"dDurMs":100,"segs":[{"utf8":"\n"}]}]}"#;
        assert!(parse_json3(body, "en").unwrap().is_empty());
    }

    #[test]
    fn list_tracks_splits_manual_and_auto() {
        let metadata = VideoMetadata {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Demo".to_string(),
            subtitles: HashMap::from([(
                "en".to_string(),
                vec![CaptionFormat { url: "https://example/tt".to_string(), ext: Some("json3".to_string()) }],
            )]),
            automatic_captions: HashMap::from([(
                "de".to_string(),
                vec![CaptionFormat { url: "https://example/tt-de".to_string(), ext: Some("json3".to_string()) }],
            )]),
        };
        let source = YtDlpTranscriptSource::new(metadata);
        let mut tracks = futures::executor::block_on(source.list_tracks("dQw4w9WgXcQ")).unwrap();
        tracks.sort_by(|a, b| a.language.cmp(&b.language));
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().any(|t| t.language == "en" && !t.is_auto));
        assert!(tracks.iter().any(|t| t.language == "de" && t.is_auto));
    }
}
