//! Command-line application: batch processing, sample download and self-check.

use crate::{
    config::{Config, EXAMPLE_CONFIG},
    detection::YoloDetector,
    download::VideoDownloader,
    pipeline::{MetricsScope, PipelineOrchestrator},
    pose::MoveNetEstimator,
    report::generate_report,
    utils::{file_name, video_stem},
    Result,
};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sports player detection, pose estimation and tracking", long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Process videos and write annotated output plus reports
    Run {
        /// Videos to process (defaults to the configured list)
        videos: Vec<PathBuf>,

        /// Frames processed per video
        #[arg(short, long)]
        max_frames: Option<usize>,

        /// Directory for annotated videos and reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Restart latency metrics for every video
        #[arg(long)]
        per_video_metrics: bool,
    },
    /// Download sample videos
    Download {
        /// Urls to fetch (defaults to the configured list)
        urls: Vec<String>,

        /// Directory to write videos to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Report OpenCV version and whether the configured models load
    Check,
    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "config.yaml")]
        path: PathBuf,
    },
}

/// Load `path` if given, falling back to defaults when it is missing or invalid
#[must_use]
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };

    info!("Loading configuration from: {}", path.display());
    let loaded = Config::from_file(path).and_then(|cfg| cfg.validate().map(|()| cfg));
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Failed to load config file: {e}. Using defaults.");
            Config::default()
        }
    }
}

/// Apply subcommand overrides and dispatch
///
/// # Errors
///
/// Returns an error if models cannot be loaded for `run` or a file cannot be written
pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            videos,
            max_frames,
            output_dir,
            per_video_metrics,
        } => {
            if !videos.is_empty() {
                config.pipeline.videos = videos;
            }
            if let Some(max_frames) = max_frames {
                config.pipeline.max_frames = max_frames;
            }
            if let Some(output_dir) = output_dir {
                config.pipeline.output_dir = output_dir;
            }
            if per_video_metrics {
                config.pipeline.metrics_scope = MetricsScope::PerVideo;
            }
            run_pipeline(&config)?;
        }
        Commands::Download { urls, output_dir } => {
            if !urls.is_empty() {
                config.download.urls = urls;
            }
            if let Some(output_dir) = output_dir {
                config.download.output_dir = output_dir;
            }
            download_sample_videos(&config)?;
        }
        Commands::Check => {
            if !check_installation(&config) {
                warn!("Installation check found problems");
            }
        }
        Commands::InitConfig { path } => {
            std::fs::write(&path, EXAMPLE_CONFIG)?;
            info!("Example configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Candidate videos that exist on disk, in order
#[must_use]
pub fn existing_videos(candidates: &[PathBuf]) -> Vec<PathBuf> {
    candidates.iter().filter(|p| p.is_file()).cloned().collect()
}

/// `<output_dir>/tracked_<basename>`
#[must_use]
pub fn tracked_output_path(output_dir: &Path, video: &Path) -> PathBuf {
    output_dir.join(format!("tracked_{}", file_name(video)))
}

/// Process every existing configured video with one orchestrator.
/// Returns the number of videos that produced results.
///
/// # Errors
///
/// Returns an error if the models cannot be loaded or the output directory
/// cannot be created
pub fn run_pipeline(config: &Config) -> Result<usize> {
    info!("Starting Sports Player Tracking Pipeline...");

    let videos = existing_videos(&config.pipeline.videos);
    if videos.is_empty() {
        warn!("No video files found!");
        info!("Please add your video files to the data/videos/ folder");
        info!("Expected names: sports_video_1.mp4, sports_video_2.mp4, etc.");
        info!("Or pass video paths to `run`, or list them under pipeline.videos in the config");
        return Ok(0);
    }
    info!("Found {} video(s) to process", videos.len());

    let output_dir = &config.pipeline.output_dir;
    std::fs::create_dir_all(output_dir)?;

    let mut orchestrator = PipelineOrchestrator::from_config(config)?;
    let mut completed = 0;

    for video in &videos {
        info!("{}", "=".repeat(50));
        info!("PROCESSING: {}", file_name(video));
        info!("{}", "=".repeat(50));

        let output_path = tracked_output_path(output_dir, video);
        let results = orchestrator.process_video(video, Some(&output_path), config.pipeline.max_frames);

        if results.is_empty() {
            warn!("No results for {}", file_name(video));
            continue;
        }

        let performance = orchestrator.calculate_performance_metrics();
        if let Err(e) = generate_report(&results, performance, &video_stem(video), output_dir) {
            error!("Failed to write report for {}: {e}", file_name(video));
        }
        completed += 1;

        info!("COMPLETED: {}", file_name(video));
        info!("Performance: {:.2} FPS", performance.fps);
    }

    info!("PIPELINE COMPLETED!");
    info!("  Processed {} video(s)", videos.len());
    info!("  Outputs saved in '{}'", output_dir.display());
    Ok(completed)
}

/// Download the configured urls as `sports_video_<n>`
///
/// # Errors
///
/// Returns an error if the download directory cannot be created
pub fn download_sample_videos(config: &Config) -> Result<Vec<bool>> {
    let downloader = VideoDownloader::new(&config.download.output_dir)?
        .with_max_height(config.download.max_height)
        .with_program(config.download.yt_dlp.clone());

    let outcomes = downloader.download_all(&config.download.urls);
    let ok = outcomes.iter().filter(|&&ok| ok).count();
    if !outcomes.is_empty() {
        info!("Downloaded {ok}/{} video(s)", outcomes.len());
    }
    Ok(outcomes)
}

/// Log library versions and try loading each configured model.
/// Returns whether everything needed for `run` is available.
#[must_use]
pub fn check_installation(config: &Config) -> bool {
    let mut ok = true;

    match opencv::core::get_version_string() {
        Ok(version) => info!("OpenCV version: {version}"),
        Err(e) => {
            error!("OpenCV unavailable: {e}");
            ok = false;
        }
    }

    match YoloDetector::new(
        &config.models.detector,
        config.detection.confidence_threshold,
        config.detection.nms_iou_threshold,
    ) {
        Ok(detector) => info!("Detector model loads (input {}px)", detector.input_size()),
        Err(e) => {
            error!("Detector model {} failed to load: {e}", config.models.detector.display());
            ok = false;
        }
    }

    match MoveNetEstimator::new(&config.models.pose, config.pose.min_pose_confidence) {
        Ok(_) => info!("Pose model loads"),
        Err(e) => {
            error!("Pose model {} failed to load: {e}", config.models.pose.display());
            ok = false;
        }
    }

    // Only needed for `download`
    match Command::new(&config.download.yt_dlp).arg("--version").output() {
        Ok(out) if out.status.success() => {
            info!("yt-dlp version: {}", String::from_utf8_lossy(&out.stdout).trim());
        }
        _ => warn!("{} not found; `download` will not work", config.download.yt_dlp),
    }

    if ok {
        info!("All checks passed");
    }
    ok
}
