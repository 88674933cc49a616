use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarezkaError {
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Could not probe media duration for {}: {reason}", .path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("No transcript available for video {video_id}")]
    NoTranscriptAvailable { video_id: String },

    #[error("Caption track fetch failed for {language}: {reason}")]
    TrackFetchFailed { language: String, reason: String },

    #[error("AI response was not parseable: {reason}")]
    MalformedResponse { reason: String },

    #[error("AI response did not match the segment schema: {reason}")]
    SchemaViolation { reason: String },

    #[error("Segment extraction exhausted after {attempts} attempts")]
    ExtractionExhausted { attempts: u32 },

    #[error("Cut failed for {}: {reason}", .output.display())]
    CutFailed { output: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, NarezkaError>;
