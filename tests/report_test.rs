//! Report summary, markdown and plot tests

mod test_helpers;

use opencv::prelude::*;
use sports_player_tracking::{
    metrics::PerformanceSummary,
    pipeline::FrameResult,
    report::{generate_report, per_frame_confidence, render_metrics_plot, VideoSummary},
    tracking::PlayerTracker,
    Result,
};
use test_helpers::detections;

fn performance() -> PerformanceSummary {
    PerformanceSummary {
        average_detection_time: 0.0123,
        average_pose_time: 0.004,
        average_tracking_time: 0.00001,
        total_frames: 3,
        fps: 81.3,
    }
}

fn results(counts: &[usize]) -> Vec<FrameResult> {
    let mut tracker = PlayerTracker::default();
    counts
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let dets = detections(n);
            FrameResult {
                frame_number: i + 1,
                tracks: tracker.update(&dets),
                detections: dets,
                poses: vec![],
            }
        })
        .collect()
}

#[test]
fn test_summary_counts() {
    let summary = VideoSummary::from_results(&results(&[2, 0, 1]), performance()).unwrap();

    assert_eq!(summary.frame_count, 3);
    assert_eq!(summary.detection_metrics.total_detections, 3);
    assert!((summary.detection_metrics.detections_per_frame - 1.0).abs() < 1e-9);
    // Confidences 0.5, 0.6, 0.5
    assert!((summary.detection_metrics.average_confidence - 1.6 / 3.0).abs() < 1e-6);
    assert_eq!(summary.tracking_metrics.total_tracks, 3);
}

#[test]
fn test_total_tracks_counts_unique_ids() {
    let mut rs = results(&[2, 1]);
    // Duplicate an id from the first frame into the second
    let repeated = rs[0].tracks[0];
    rs[1].tracks.push(repeated);

    let summary = VideoSummary::from_results(&rs, performance()).unwrap();
    assert_eq!(summary.tracking_metrics.total_tracks, 3);
}

#[test]
fn test_empty_results_produce_nothing() -> Result<()> {
    assert!(VideoSummary::from_results(&[], performance()).is_none());

    let dir = tempfile::tempdir()?;
    assert!(generate_report(&[], performance(), "empty", dir.path())?.is_none());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_json_field_names() {
    let summary = VideoSummary::from_results(&results(&[1]), performance()).unwrap();
    let value = serde_json::to_value(summary).unwrap();

    for key in ["total_detections", "average_confidence", "detections_per_frame"] {
        assert!(value["detection_metrics"].get(key).is_some(), "missing {key}");
    }
    assert!(value["tracking_metrics"].get("total_tracks").is_some());
    for key in [
        "average_detection_time",
        "average_pose_time",
        "average_tracking_time",
        "total_frames",
        "fps",
    ] {
        assert!(value["performance_metrics"].get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["frame_count"], 1);
}

#[test]
fn test_markdown_formatting() {
    let summary = VideoSummary::from_results(&results(&[2, 0, 1]), performance()).unwrap();
    let md = summary.to_markdown("Badminton_1", "2024-01-01 12:00:00");

    assert!(md.starts_with("# Player Tracking Report - Badminton_1"));
    assert!(md.contains("- **Average Detection Time:** 12.30 ms"));
    assert!(md.contains("- **Average Detection Confidence:** 0.533"));
    assert!(md.contains("- **Average Detections per Frame:** 1.00"));
    assert!(md.contains("- **Processing FPS:** 81.30"));
    assert!(md.contains("- **Tracking:** Simple ID Assignment"));
    assert!(md.contains("![Metrics](Badminton_1_metrics.png)"));
    assert!(md.contains("*Generated on: 2024-01-01 12:00:00*"));
}

#[test]
fn test_per_frame_confidence_zero_for_empty_frames() {
    let conf = per_frame_confidence(&results(&[1, 0]));
    assert_eq!(conf.len(), 2);
    assert!((conf[0] - 0.5).abs() < 1e-6);
    assert_eq!(conf[1], 0.0);
}

#[test]
fn test_plot_has_two_panels() -> Result<()> {
    let plot = render_metrics_plot(&results(&[2, 0, 1, 3]))?;
    assert_eq!(plot.cols(), 1200);
    assert_eq!(plot.rows(), 400);
    Ok(())
}

#[test]
fn test_generate_report_writes_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = generate_report(&results(&[2, 0, 1]), performance(), "clip", dir.path())?.unwrap();

    assert!(paths.plot.exists());
    assert!(paths.markdown.ends_with("clip_report.md"));

    let json = std::fs::read_to_string(&paths.json)?;
    // Pretty-printed with two-space indentation
    assert!(json.contains("\n  \"detection_metrics\": {"));
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["tracking_metrics"]["total_tracks"], 3);
    Ok(())
}
