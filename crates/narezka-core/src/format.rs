use crate::types::{ClipArtifact, ClipStatus, TranscriptLine};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format transcript lines for the discovery prompt. Absolute second ranges
/// let the model anchor its answer in the same unit the validator checks.
pub fn format_transcript_for_prompt(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|line| format!("[{:.1}s - {:.1}s] {}", line.start, line.end, line.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the clip artifacts of one run as a human-readable record, one block
/// per segment with a fixed label order.
pub fn format_artifacts_readable(video_title: &str, artifacts: &[ClipArtifact]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Video Title: {}\n", video_title));
    output.push_str(&format!("Total Segments: {}\n\n", artifacts.len()));

    for (i, artifact) in artifacts.iter().enumerate() {
        let segment = &artifact.segment;
        output.push_str(&format!(
            "--- Segment {} [{} - {}] ---\n",
            i + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        ));
        output.push_str(&format!("  Title: {}\n", segment.title));
        output.push_str(&format!("  Start Time: {:.2}s\n", segment.start));
        output.push_str(&format!("  End Time: {:.2}s\n", segment.end));
        output.push_str(&format!("  Duration: {:.2}s\n", segment.duration()));
        output.push_str(&format!(
            "  Hook: {}\n",
            if segment.hook.is_empty() { "N/A" } else { &segment.hook }
        ));
        output.push_str(&format!("  Description: {}\n", segment.description));

        let platforms = segment
            .platforms
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!(
            "  Platforms: {}\n",
            if platforms.is_empty() { "N/A".to_string() } else { platforms }
        ));

        let hashtags = segment.hashtags.join(" ");
        output.push_str(&format!(
            "  Hashtags: {}\n",
            if hashtags.is_empty() { "N/A".to_string() } else { hashtags }
        ));

        match artifact.status {
            ClipStatus::Cut => output.push_str("  Status: Cut\n"),
            ClipStatus::Failed => output.push_str(&format!(
                "  Status: Failed ({})\n",
                artifact.error.as_deref().unwrap_or("unknown error")
            )),
        }
        output.push_str(&format!(
            "  Output Path: {}\n\n",
            artifact
                .output_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ));
    }

    output
}
