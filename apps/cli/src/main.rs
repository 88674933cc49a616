use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing_subscriber::EnvFilter;

use narezka_core::{
    ChatCompletionClient, ExtractorConfig, FfmpegCutter, Pipeline, PipelineConfig, Provider,
    RunReport, RunStatus, YtDlpTranscriptSource, download_video, extract_video_id, fetch_metadata,
    find_video_in_cache, format_timestamp, get_cache_dir, open_media, sanitize_title,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openrouter,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openrouter => Provider::OpenRouter,
            CliProvider::Openai => Provider::OpenAi,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "narezka")]
#[command(
    about = "Find viral-worthy segments in a YouTube video and cut them into platform-ready clips"
)]
struct Cli {
    /// Video URL or bare video ID
    url: String,

    /// Target transcript language
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// AI provider for segment discovery
    #[arg(short, long, default_value = "openrouter")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for generated clips and metadata
    #[arg(short, long, default_value = "clips")]
    output_dir: PathBuf,

    /// Parallel ffmpeg jobs (defaults to the CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Attempts before giving up on a malformed AI response
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Force re-download even if a cached video exists
    #[arg(short, long)]
    force: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_report(report: &RunReport) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "Segments: {} discovered, {} validated, {} rejected",
        report.segments_discovered,
        style(report.segments_validated).green().bold(),
        style(report.candidates_rejected).yellow()
    );
    println!(
        "Clips:    {} cut, {} failed",
        style(report.clips_cut).green().bold(),
        if report.clips_failed > 0 {
            style(report.clips_failed).red().bold()
        } else {
            style(report.clips_failed).dim()
        }
    );
    if let Some(source) = &report.transcript_source {
        println!("Transcript source: {source}");
    }
    if let Some(path) = &report.json_path {
        println!("{} {}", style("Segments JSON:").dim(), style(path.display()).cyan());
    }
    if let Some(path) = &report.text_path {
        println!("{} {}", style("Metadata:").dim(), style(path.display()).cyan());
    }
    if !report.errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for error in &report.errors {
            println!("  {} {}", style("•").red(), error);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let Some(video_id) = extract_video_id(&cli.url) else {
        eprintln!(
            "{} could not extract a video ID from '{}'",
            style("Error:").red().bold(),
            cli.url
        );
        std::process::exit(1);
    };
    let url = format!("https://www.youtube.com/watch?v={video_id}");

    println!(
        "\n{}  {}\n",
        style("narezka").cyan().bold(),
        style("Viral Clip Finder").dim()
    );

    // Step 1: Metadata (title + advertised caption tracks)
    let spinner = create_spinner("Fetching video metadata...");
    let metadata = fetch_metadata(&video_id).await?;
    let video_title = sanitize_title(&metadata.title);
    spinner.finish_with_message(format!(
        "{} Found: {}",
        style("✓").green().bold(),
        style(&metadata.title).yellow()
    ));

    // Step 2: Download (check cache)
    let cache_dir = get_cache_dir(&url);
    fs::create_dir_all(&cache_dir).await?;
    let video_file = if !cli.force
        && let Some(cached) = find_video_in_cache(&cache_dir)
    {
        println!(
            "{} Downloaded {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        cached
    } else {
        let spinner = create_spinner("Downloading video...");
        let video = download_video(&url, &cache_dir).await?;
        spinner.finish_with_message(format!(
            "{} Downloaded: {}",
            style("✓").green().bold(),
            style(video.file_name().unwrap_or_default().to_string_lossy()).dim()
        ));
        video
    };

    // Step 3: Probe duration
    let media = open_media(video_file).await?;
    println!(
        "{} Duration: {}",
        style("✓").green().bold(),
        style(format_timestamp(media.duration)).yellow()
    );

    // Step 4: Run the pipeline
    let source = Arc::new(YtDlpTranscriptSource::new(metadata));
    let client = Arc::new(ChatCompletionClient::from_provider(&provider, cli.model)?);
    println!(
        "{} Model: {} ({})",
        style("✓").green().bold(),
        style(client.model()).yellow(),
        provider.name()
    );

    let config = PipelineConfig {
        target_lang: cli.lang,
        output_dir: cli.output_dir,
        extractor: ExtractorConfig {
            max_attempts: cli.max_attempts,
            ..ExtractorConfig::default()
        },
        jobs: cli.jobs.unwrap_or_else(num_cpus::get),
    };
    let pipeline = Pipeline::new(source, client, Arc::new(FfmpegCutter), config);

    let spinner = create_spinner("Discovering and cutting clips...");
    let report = pipeline.run(&video_id, &media, &video_title).await;
    match report.status {
        RunStatus::Completed => spinner.finish_with_message(format!(
            "{} Pipeline finished",
            style("✓").green().bold()
        )),
        RunStatus::Failed => spinner.finish_with_message(format!(
            "{} Pipeline failed",
            style("✗").red().bold()
        )),
    }

    print_report(&report);

    if report.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}
