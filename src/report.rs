//! Per-video summary JSON, markdown report and metrics plot.

use crate::{
    constants::MS_PER_SECOND,
    metrics::PerformanceSummary,
    pipeline::FrameResult,
    utils::safe_cast::{f64_to_i32, usize_to_i32},
    Error, Result,
};
use log::info;
use opencv::{
    core::{Mat, Point, Scalar, Vector, CV_8UC3},
    imgcodecs,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const PANEL_WIDTH: i32 = 600;
const PANEL_HEIGHT: i32 = 400;
const MARGIN_LEFT: i32 = 70;
const MARGIN_RIGHT: i32 = 20;
const MARGIN_TOP: i32 = 40;
const MARGIN_BOTTOM: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    pub total_detections: usize,
    pub average_confidence: f64,
    pub detections_per_frame: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingMetrics {
    /// Number of distinct track ids seen in the video
    pub total_tracks: usize,
}

/// Contents of `<stem>_results.json`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub detection_metrics: DetectionMetrics,
    pub tracking_metrics: TrackingMetrics,
    pub performance_metrics: PerformanceSummary,
    pub frame_count: usize,
}

impl VideoSummary {
    /// Summarize a video's frame results; `None` when there are none
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[FrameResult], performance: PerformanceSummary) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let confidences: Vec<f64> = results
            .iter()
            .flat_map(|r| r.detections.iter().map(|d| f64::from(d.confidence)))
            .collect();
        let total_detections = confidences.len();
        let unique_ids: HashSet<u64> = results
            .iter()
            .flat_map(|r| r.tracks.iter().map(|t| t.track_id))
            .collect();

        Some(Self {
            detection_metrics: DetectionMetrics {
                total_detections,
                average_confidence: crate::utils::mean(&confidences),
                detections_per_frame: total_detections as f64 / results.len() as f64,
            },
            tracking_metrics: TrackingMetrics {
                total_tracks: unique_ids.len(),
            },
            performance_metrics: performance,
            frame_count: results.len(),
        })
    }

    /// Render the human-readable report
    #[must_use]
    pub fn to_markdown(&self, video_name: &str, generated_at: &str) -> String {
        let det = &self.detection_metrics;
        let perf = &self.performance_metrics;
        format!(
            "# Player Tracking Report - {video_name}\n\
             \n\
             ## Performance Summary\n\
             - **Total Frames Processed:** {frames}\n\
             - **Total Detections:** {total}\n\
             - **Average Detections per Frame:** {per_frame:.2}\n\
             - **Total Unique Tracks:** {tracks}\n\
             - **Average Detection Confidence:** {conf:.3}\n\
             \n\
             ## System Performance\n\
             - **Average Detection Time:** {det_ms:.2} ms\n\
             - **Average Pose Time:** {pose_ms:.2} ms\n\
             - **Average Tracking Time:** {track_ms:.2} ms\n\
             - **Processing FPS:** {fps:.2}\n\
             \n\
             ## Model Architecture\n\
             - **Player Detection:** YOLOv8\n\
             - **Pose Estimation:** MoveNet SinglePose\n\
             - **Tracking:** Simple ID Assignment\n\
             \n\
             ## Sample Output\n\
             ![Metrics]({video_name}_metrics.png)\n\
             \n\
             *Generated on: {generated_at}*\n",
            frames = self.frame_count,
            total = det.total_detections,
            per_frame = det.detections_per_frame,
            tracks = self.tracking_metrics.total_tracks,
            conf = det.average_confidence,
            det_ms = perf.average_detection_time * MS_PER_SECOND,
            pose_ms = perf.average_pose_time * MS_PER_SECOND,
            track_ms = perf.average_tracking_time * MS_PER_SECOND,
            fps = perf.fps,
        )
    }
}

/// Files written for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
    pub plot: PathBuf,
}

/// Mean detection confidence per frame, 0 for frames without detections
#[must_use]
pub fn per_frame_confidence(results: &[FrameResult]) -> Vec<f64> {
    results
        .iter()
        .map(|r| {
            let conf: Vec<f64> = r.detections.iter().map(|d| f64::from(d.confidence)).collect();
            crate::utils::mean(&conf)
        })
        .collect()
}

/// Detection count per frame
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_frame_counts(results: &[FrameResult]) -> Vec<f64> {
    results.iter().map(|r| r.detections.len() as f64).collect()
}

/// Write `<name>_results.json`, `<name>_report.md` and `<name>_metrics.png`
/// into `output_dir`. Nothing is written for an empty result set.
///
/// # Errors
///
/// Returns an error if a file cannot be written or the plot cannot be encoded
pub fn generate_report(
    results: &[FrameResult],
    performance: PerformanceSummary,
    video_name: &str,
    output_dir: &Path,
) -> Result<Option<ReportPaths>> {
    let Some(summary) = VideoSummary::from_results(results, performance) else {
        info!("No results for {video_name}");
        return Ok(None);
    };

    std::fs::create_dir_all(output_dir)?;
    let paths = ReportPaths {
        json: output_dir.join(format!("{video_name}_results.json")),
        markdown: output_dir.join(format!("{video_name}_report.md")),
        plot: output_dir.join(format!("{video_name}_metrics.png")),
    };

    let plot = render_metrics_plot(results)?;
    if !imgcodecs::imwrite(&paths.plot.to_string_lossy(), &plot, &Vector::new())? {
        return Err(Error::ReportError(format!(
            "Could not encode plot {}",
            paths.plot.display()
        )));
    }

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(&paths.markdown, summary.to_markdown(video_name, &generated_at))?;
    std::fs::write(&paths.json, serde_json::to_string_pretty(&summary)?)?;

    info!("Report written to {}", paths.markdown.display());
    Ok(Some(paths))
}

/// Two side-by-side line charts: confidence and detection count per frame
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn render_metrics_plot(results: &[FrameResult]) -> Result<Mat> {
    let mut canvas = Mat::new_rows_cols_with_default(PANEL_HEIGHT, PANEL_WIDTH * 2, CV_8UC3, Scalar::all(255.0))?;

    draw_panel(
        &mut canvas,
        0,
        &per_frame_confidence(results),
        "Detection Confidence Over Time",
        "Average Confidence",
    )?;
    draw_panel(
        &mut canvas,
        PANEL_WIDTH,
        &per_frame_counts(results),
        "Number of Detections Per Frame",
        "Number of Detections",
    )?;

    Ok(canvas)
}

#[allow(clippy::cast_precision_loss)]
fn draw_panel(canvas: &mut Mat, x_offset: i32, values: &[f64], title: &str, y_label: &str) -> Result<()> {
    let black = Scalar::all(0.0);
    let gray = Scalar::all(90.0);
    let line_color = Scalar::new(180.0, 119.0, 31.0, 0.0);

    let left = x_offset + MARGIN_LEFT;
    let right = x_offset + PANEL_WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = PANEL_HEIGHT - MARGIN_BOTTOM;

    imgproc::rectangle_points(canvas, Point::new(left, top), Point::new(right, bottom), black, 1, LINE_8, 0)?;
    put_label(canvas, title, Point::new(left, top - 15), 0.55, black)?;
    put_label(canvas, "Frame Number", Point::new((left + right) / 2 - 50, PANEL_HEIGHT - 15), 0.45, gray)?;
    // No rotated text in OpenCV; the y label sits under the title
    put_label(canvas, y_label, Point::new(right - 170, top + 18), 0.4, gray)?;

    let y_max = values.iter().copied().fold(0.0_f64, f64::max).max(1.0);
    put_label(canvas, &format!("{y_max:.2}"), Point::new(x_offset + 10, top + 5), 0.4, gray)?;
    put_label(canvas, "0", Point::new(x_offset + 40, bottom), 0.4, gray)?;

    let last = values.len().saturating_sub(1);
    put_label(canvas, &last.to_string(), Point::new(right - 15, bottom + 18), 0.4, gray)?;

    let span_x = f64::from(right - left);
    let span_y = f64::from(bottom - top);
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let fx = if last == 0 { 0.0 } else { i as f64 / last as f64 };
            let x = f64_to_i32(f64::from(left) + fx * span_x)?;
            let y = f64_to_i32(f64::from(bottom) - (v / y_max) * span_y)?;
            Ok(Point::new(x, y))
        })
        .collect::<Result<Vec<Point>>>()?;

    match points.as_slice() {
        [] => {}
        [only] => {
            imgproc::circle(canvas, *only, 3, line_color, imgproc::FILLED, LINE_AA, 0)?;
        }
        _ => {
            for pair in points.windows(2) {
                imgproc::line(canvas, pair[0], pair[1], line_color, 2, LINE_AA, 0)?;
            }
        }
    }

    // Frame-count tick marks along the x axis
    let ticks = usize_to_i32(values.len().min(10))?;
    for t in 0..=ticks {
        let x = left + (right - left) * t / ticks.max(1);
        imgproc::line(canvas, Point::new(x, bottom), Point::new(x, bottom + 4), black, 1, LINE_8, 0)?;
    }

    Ok(())
}

fn put_label(canvas: &mut Mat, text: &str, origin: Point, scale: f64, color: Scalar) -> Result<()> {
    imgproc::put_text(canvas, text, origin, FONT_HERSHEY_SIMPLEX, scale, color, 1, LINE_AA, false)?;
    Ok(())
}
