use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{NarezkaError, Result};
use crate::format::format_transcript_for_prompt;
use crate::types::{CandidateSegment, Platform, TranscriptLine, ValidatedSegment};

static SEGMENT_DISCOVERY_PROMPT: &str = r##"Provided below is a timestamped transcript of a video.
Identify every segment that can be extracted as engaging, viral short-form content (15-60 seconds) for platforms like TikTok, YouTube Shorts, Instagram Reels and LinkedIn.

For each segment provide:
1. `start`: absolute start time in seconds (float), within [0, DURATION].
2. `end`: absolute end time in seconds (float), within [0, DURATION], strictly after `start`.
3. `title`: a catchy, concise title for the clip (max 70 characters).
4. `hook`: what grabs attention in the first 3-5 seconds.
5. `description`: a brief summary of the segment and why it is engaging.
6. `platforms`: a list drawn from ["YouTube_Shorts", "TikTok", "Instagram_Reels", "LinkedIn"].
7. `hashtags`: a list of relevant hashtags, e.g. ["#viral", "#funnyclips"].

Respond ONLY with a valid JSON array of segment objects. No markdown, no explanation.

Example of a segment object:
{
  "start": 120.5,
  "end": 150.0,
  "title": "Amazing Trick Shot!",
  "hook": "You won't believe what happens next!",
  "description": "A skilled performer lands an incredible trick shot that defies expectations.",
  "platforms": ["TikTok", "Instagram_Reels"],
  "hashtags": ["#trickshot", "#amazing", "#skill"]
}"##;

/// Opaque, possibly-unreliable text channel to the language model. No schema
/// is enforced on this side of the boundary.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Whole-response attempts before giving up with `ExtractionExhausted`.
    pub max_attempts: u32,
    /// First retry delay; doubles on each further attempt.
    pub backoff_base: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

/// Outcome of one successful extraction: validated segments in the order the
/// model emitted them, plus what was discarded along the way.
#[derive(Debug)]
pub struct Extraction {
    pub segments: Vec<ValidatedSegment>,
    pub discovered: usize,
    pub rejected: usize,
    pub attempts: u32,
}

/// Discovers candidate clip segments by prompting the model with the
/// timestamped transcript, then validates every candidate against the media
/// duration. Retries are reserved for whole-response malformation; rejecting a
/// single bad candidate never discards the rest of a usable response.
pub struct SegmentExtractor {
    client: Arc<dyn CompletionClient>,
    config: ExtractorConfig,
}

impl SegmentExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, config: ExtractorConfig) -> Self {
        Self { client, config }
    }

    pub async fn extract(&self, lines: &[TranscriptLine], duration: f64) -> Result<Extraction> {
        let prompt = build_prompt(lines, duration);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, max = self.config.max_attempts, "requesting segment discovery");

            let failure = match self.client.complete(&prompt).await {
                Ok(raw) => match parse_candidates(&raw) {
                    Ok(candidates) => {
                        let discovered = candidates.len();
                        let (segments, rejected) = validate_candidates(candidates, duration);
                        info!(discovered, validated = segments.len(), rejected, attempt, "segment discovery complete");
                        return Ok(Extraction {
                            segments,
                            discovered,
                            rejected,
                            attempts: attempt,
                        });
                    }
                    Err(err) => err,
                },
                Err(err) => err,
            };

            warn!(attempt, %failure, "segment discovery attempt failed");
            if attempt >= self.config.max_attempts {
                return Err(NarezkaError::ExtractionExhausted { attempts: attempt });
            }

            // Sequential attempts only: wait out the backoff before re-sending
            // the same prompt.
            let delay = self.config.backoff_base * 2u32.pow(attempt - 1);
            tokio::time::sleep(delay).await;
        }
    }
}

fn build_prompt(lines: &[TranscriptLine], duration: f64) -> String {
    format!(
        "{}\n\nThe video is {:.1} seconds long; every `start` and `end` must fall within [0, {:.1}].\n\nHere is the transcript:\n{}",
        SEGMENT_DISCOVERY_PROMPT,
        duration,
        duration,
        format_transcript_for_prompt(lines)
    )
}

/// Parse a raw model response into candidate segments.
///
/// Accepts the instructed bare array as well as a `{"segments": [...]}`
/// wrapper and a response fenced in triple backticks, both of which models
/// produce in practice. Unparseable text is a `MalformedResponse`; parseable
/// JSON of the wrong shape (or an element missing `start`/`end`/`title`) is a
/// `SchemaViolation`. Both fail the whole response.
pub fn parse_candidates(raw: &str) -> Result<Vec<CandidateSegment>> {
    let body = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| NarezkaError::MalformedResponse {
            reason: e.to_string(),
        })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("segments") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(NarezkaError::SchemaViolation {
                    reason: "expected a JSON array of segment objects".to_string(),
                });
            }
        },
        _ => {
            return Err(NarezkaError::SchemaViolation {
                reason: "expected a JSON array of segment objects".to_string(),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<CandidateSegment>(item).map_err(|e| {
                NarezkaError::SchemaViolation {
                    reason: format!("segment {i}: {e}"),
                }
            })
        })
        .collect()
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }
    trimmed
}

/// Validate candidates field by field. A partially-good response is still
/// useful: bad candidates are counted and dropped, never escalated.
pub fn validate_candidates(
    candidates: Vec<CandidateSegment>,
    duration: f64,
) -> (Vec<ValidatedSegment>, usize) {
    let mut segments = Vec::with_capacity(candidates.len());
    let mut rejected = 0;

    for (i, candidate) in candidates.into_iter().enumerate() {
        match validate_candidate(candidate, duration) {
            Ok(segment) => segments.push(segment),
            Err(reason) => {
                warn!(index = i, reason, "rejected candidate segment");
                rejected += 1;
            }
        }
    }

    (segments, rejected)
}

fn coerce_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Models occasionally emit "12.5" or "12.5s"
        Value::String(s) => s.trim().trim_end_matches('s').trim().parse().ok(),
        _ => None,
    }
}

fn validate_candidate(
    candidate: CandidateSegment,
    duration: f64,
) -> std::result::Result<ValidatedSegment, String> {
    let start = coerce_seconds(&candidate.start)
        .ok_or_else(|| format!("start is not numeric: {}", candidate.start))?;
    let end = coerce_seconds(&candidate.end)
        .ok_or_else(|| format!("end is not numeric: {}", candidate.end))?;

    if !start.is_finite() || !end.is_finite() {
        return Err(format!("non-finite time range {start}..{end}"));
    }
    if start < 0.0 {
        return Err(format!("start {start} is negative"));
    }
    if start >= end {
        return Err(format!("start {start} is not before end {end}"));
    }
    if end > duration {
        return Err(format!("end {end} exceeds media duration {duration}"));
    }

    let title = candidate.title.trim().to_string();
    if title.is_empty() {
        return Err("title is empty".to_string());
    }

    let description = {
        let d = candidate.description.trim();
        if d.is_empty() { title.clone() } else { d.to_string() }
    };

    let mut platforms: Vec<Platform> = Vec::new();
    for name in &candidate.platforms {
        match Platform::parse(name.trim()) {
            Some(platform) if !platforms.contains(&platform) => platforms.push(platform),
            Some(_) => {}
            None => debug!(platform = %name, "dropping unknown platform"),
        }
    }

    let mut hashtags: Vec<String> = Vec::new();
    for tag in candidate.hashtags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !hashtags.contains(&tag) {
            hashtags.push(tag);
        }
    }

    Ok(ValidatedSegment {
        start,
        end,
        title,
        hook: candidate.hook.trim().to_string(),
        description,
        platforms,
        hashtags,
    })
}
