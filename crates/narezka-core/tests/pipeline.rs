use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use narezka_core::{
    CompletionClient, CutEngine, ExtractorConfig, MediaHandle, NarezkaError, Pipeline,
    PipelineConfig, Platform, RunStatus, Stage, TrackInfo, TranscriptLine, TranscriptSource,
};

struct FixedTranscript {
    lines: Vec<TranscriptLine>,
}

#[async_trait]
impl TranscriptSource for FixedTranscript {
    async fn list_tracks(&self, _video_id: &str) -> narezka_core::Result<Vec<TrackInfo>> {
        Ok(vec![TrackInfo {
            language: "en".to_string(),
            is_auto: false,
        }])
    }

    async fn fetch_track(
        &self,
        _video_id: &str,
        _language: &str,
        _auto: bool,
    ) -> narezka_core::Result<Vec<TranscriptLine>> {
        Ok(self.lines.clone())
    }

    async fn translate_track(
        &self,
        _video_id: &str,
        language: &str,
        _auto: bool,
        _target: &str,
    ) -> narezka_core::Result<Vec<TranscriptLine>> {
        Err(NarezkaError::TrackFetchFailed {
            language: language.to_string(),
            reason: "unused in this test".to_string(),
        })
    }
}

struct FixedCompletion {
    response: String,
    calls: AtomicU32,
}

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(&self, _prompt: &str) -> narezka_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

struct TouchCutter;

#[async_trait]
impl CutEngine for TouchCutter {
    async fn cut(
        &self,
        _source: &Path,
        _start: f64,
        _end: f64,
        output: &Path,
    ) -> narezka_core::Result<()> {
        tokio::fs::write(output, b"clip").await?;
        Ok(())
    }
}

fn transcript() -> Vec<TranscriptLine> {
    vec![
        TranscriptLine {
            start: 0.0,
            end: 5.0,
            text: "intro".to_string(),
            language: "en".to_string(),
        },
        TranscriptLine {
            start: 5.0,
            end: 30.0,
            text: "story".to_string(),
            language: "en".to_string(),
        },
    ]
}

fn config(output_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        target_lang: "en".to_string(),
        output_dir: output_dir.to_path_buf(),
        extractor: ExtractorConfig {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
        },
        jobs: 2,
    }
}

#[tokio::test]
async fn one_good_candidate_flows_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaHandle {
        path: dir.path().join("source.mp4"),
        duration: 30.0,
    };

    let response = r##"[{
        "start": 4, "end": 28, "title": "Hook",
        "platforms": ["TikTok", "Bogus"],
        "hashtags": ["#a", "#a"]
    }]"##;

    let pipeline = Pipeline::new(
        Arc::new(FixedTranscript { lines: transcript() }),
        Arc::new(FixedCompletion {
            response: response.to_string(),
            calls: AtomicU32::new(0),
        }),
        Arc::new(TouchCutter),
        config(dir.path()),
    );

    let report = pipeline.run("dQw4w9WgXcQ", &media, "Demo").await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.segments_discovered, 1);
    assert_eq!(report.segments_validated, 1);
    assert_eq!(report.candidates_rejected, 0);
    assert_eq!(report.clips_cut, 1);
    assert_eq!(report.clips_failed, 0);

    // the unknown platform was dropped, so the clip only lands in TikTok
    let tiktok_entries = std::fs::read_dir(dir.path().join("TikTok")).unwrap().count();
    assert_eq!(tiktok_entries, 1);
    for platform in [Platform::YoutubeShorts, Platform::InstagramReels, Platform::LinkedIn] {
        let entries = std::fs::read_dir(dir.path().join(platform.dir_name())).unwrap().count();
        assert_eq!(entries, 0, "{platform} should be empty");
    }

    // structured record: deduplicated hashtags, known platform only
    let json = std::fs::read_to_string(report.json_path.unwrap()).unwrap();
    let record: serde_json::Value = serde_json::from_str(&json).unwrap();
    let segment = &record["segments"][0];
    assert_eq!(segment["platforms"], serde_json::json!(["TikTok"]));
    assert_eq!(segment["hashtags"], serde_json::json!(["#a"]));
    assert_eq!(segment["status"], "Cut");
}

#[tokio::test]
async fn persistent_garbage_fails_the_run_with_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaHandle {
        path: dir.path().join("source.mp4"),
        duration: 30.0,
    };

    let client = Arc::new(FixedCompletion {
        response: "not json".to_string(),
        calls: AtomicU32::new(0),
    });
    let pipeline = Pipeline::new(
        Arc::new(FixedTranscript { lines: transcript() }),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
        Arc::new(TouchCutter),
        config(dir.path()),
    );

    let report = pipeline.run("dQw4w9WgXcQ", &media, "Demo").await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.stage, Stage::Failed);
    assert_eq!(report.segments_validated, 0);
    assert_eq!(report.clips_cut, 0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    assert!(report.errors.iter().any(|e| e.contains("exhausted after 3 attempts")));
}

#[tokio::test]
async fn missing_transcript_short_circuits_every_later_stage() {
    struct NoTracks;

    #[async_trait]
    impl TranscriptSource for NoTracks {
        async fn list_tracks(&self, _video_id: &str) -> narezka_core::Result<Vec<TrackInfo>> {
            Ok(vec![])
        }
        async fn fetch_track(
            &self,
            _video_id: &str,
            language: &str,
            _auto: bool,
        ) -> narezka_core::Result<Vec<TranscriptLine>> {
            Err(NarezkaError::TrackFetchFailed {
                language: language.to_string(),
                reason: "no tracks".to_string(),
            })
        }
        async fn translate_track(
            &self,
            _video_id: &str,
            language: &str,
            _auto: bool,
            _target: &str,
        ) -> narezka_core::Result<Vec<TranscriptLine>> {
            Err(NarezkaError::TrackFetchFailed {
                language: language.to_string(),
                reason: "no tracks".to_string(),
            })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let media = MediaHandle {
        path: dir.path().join("source.mp4"),
        duration: 30.0,
    };
    let client = Arc::new(FixedCompletion {
        response: "[]".to_string(),
        calls: AtomicU32::new(0),
    });
    let pipeline = Pipeline::new(
        Arc::new(NoTracks),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
        Arc::new(TouchCutter),
        config(dir.path()),
    );

    let report = pipeline.run("dQw4w9WgXcQ", &media, "Demo").await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.stage, Stage::Failed);
    assert!(report.errors.iter().any(|e| e.contains("No transcript available")));
    // the model was never consulted
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    // and no output directories were created
    assert!(!dir.path().join("TikTok").exists());
}

#[tokio::test]
async fn empty_but_valid_response_completes_with_zero_clips() {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaHandle {
        path: dir.path().join("source.mp4"),
        duration: 30.0,
    };
    let pipeline = Pipeline::new(
        Arc::new(FixedTranscript { lines: transcript() }),
        Arc::new(FixedCompletion {
            response: "[]".to_string(),
            calls: AtomicU32::new(0),
        }),
        Arc::new(TouchCutter),
        config(dir.path()),
    );

    let report = pipeline.run("dQw4w9WgXcQ", &media, "Demo").await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.segments_validated, 0);
    assert!(report.json_path.is_none());
}
