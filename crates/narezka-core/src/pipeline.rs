use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::cutter::{ClipCutter, CutEngine};
use crate::extractor::{CompletionClient, ExtractorConfig, SegmentExtractor};
use crate::output::OutputOrganizer;
use crate::transcript::{TranscriptNormalizer, TranscriptSource};
use crate::types::{ClipStatus, MediaHandle, RunReport, RunStatus};

/// Stages of one run. Strictly linear; `Failed` is terminal and only entered
/// when a stage leaves nothing for the rest of the run to work on. Per-item
/// failures degrade the report instead of changing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Init,
    TranscriptFetching,
    SegmentExtraction,
    ClipCutting,
    Organizing,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_lang: String,
    pub output_dir: PathBuf,
    pub extractor: ExtractorConfig,
    /// Parallel cut jobs; cutting is the only parallel stage.
    pub jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_lang: "en".to_string(),
            output_dir: PathBuf::from("clips"),
            extractor: ExtractorConfig::default(),
            jobs: num_cpus::get(),
        }
    }
}

/// Sequences transcript normalization, segment discovery, clip cutting and
/// output organization for one video, folding every per-stage and per-item
/// error into the final [`RunReport`].
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    client: Arc<dyn CompletionClient>,
    engine: Arc<dyn CutEngine>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        client: Arc<dyn CompletionClient>,
        engine: Arc<dyn CutEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            client,
            engine,
            config,
        }
    }

    /// Runs the whole pipeline. Always returns a report; a total absence of
    /// input (no transcript, or extraction exhausted) marks the run failed,
    /// while individual clip failures only degrade the report.
    pub async fn run(&self, video_id: &str, media: &MediaHandle, video_title: &str) -> RunReport {
        let mut report = RunReport::new();

        report.stage = Stage::TranscriptFetching;
        let normalizer = TranscriptNormalizer::new(self.config.target_lang.clone());
        let transcript = match normalizer.normalize(self.source.as_ref(), video_id).await {
            Ok(transcript) => transcript,
            Err(err) => {
                error!(%err, "transcript fetching failed, run aborted");
                report.errors.push(err.to_string());
                report.stage = Stage::Failed;
                return report;
            }
        };
        report.transcript_source = Some(transcript.source.clone());
        report.transcript_lines = transcript.lines.len();

        report.stage = Stage::SegmentExtraction;
        let extractor = SegmentExtractor::new(Arc::clone(&self.client), self.config.extractor.clone());
        let extraction = match extractor.extract(&transcript.lines, media.duration).await {
            Ok(extraction) => extraction,
            Err(err) => {
                // Exhaustion leaves zero segments; downstream stages have
                // nothing to do.
                error!(%err, "segment extraction exhausted");
                report.errors.push(err.to_string());
                report.stage = Stage::Failed;
                return report;
            }
        };
        report.segments_discovered = extraction.discovered;
        report.segments_validated = extraction.segments.len();
        report.candidates_rejected = extraction.rejected;

        if extraction.segments.is_empty() {
            info!("no validated segments, skipping cutting and organization");
            report.stage = Stage::Done;
            report.status = RunStatus::Completed;
            return report;
        }

        report.stage = Stage::ClipCutting;
        let cutter = ClipCutter::new(Arc::clone(&self.engine), self.config.jobs);
        let artifacts = match cutter
            .cut_all(media, &extraction.segments, &self.config.output_dir, video_title)
            .await
        {
            Ok(artifacts) => artifacts,
            Err(err) => {
                error!(%err, "could not prepare the clip output directory");
                report.errors.push(err.to_string());
                report.stage = Stage::Failed;
                return report;
            }
        };
        report.clips_cut = artifacts.iter().filter(|a| a.status == ClipStatus::Cut).count();
        report.clips_failed = artifacts.len() - report.clips_cut;
        for artifact in &artifacts {
            if let Some(error) = &artifact.error {
                report.errors.push(format!("{}: {error}", artifact.segment.title));
            }
        }

        report.stage = Stage::Organizing;
        let organizer = OutputOrganizer::new(&self.config.output_dir);
        match organizer.organize(video_title, &artifacts).await {
            Ok(output) => {
                report.json_path = Some(output.json_path);
                report.text_path = Some(output.text_path);
            }
            // degraded run, not a failed one
            Err(err) => report.errors.push(err.to_string()),
        }

        report.stage = Stage::Done;
        report.status = RunStatus::Completed;
        report
    }
}
