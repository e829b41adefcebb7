//! End-to-end tests over real video files written with OpenCV

mod test_helpers;

use opencv::{
    core::Size,
    prelude::*,
    videoio::VideoWriter,
};
use sports_player_tracking::{
    app::{existing_videos, tracked_output_path},
    pipeline::{MetricsScope, PipelineOrchestrator},
    tracking::PlayerTracker,
    video::{FrameSource, VideoFileSource},
    Result,
};
use std::path::{Path, PathBuf};
use test_helpers::{create_test_frame, CountingPoseEstimator, ScriptedDetector};

/// Write `count` MJPG frames; `None` when this OpenCV build cannot encode
fn write_clip(path: &Path, count: usize) -> Result<Option<()>> {
    let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
    let mut writer = VideoWriter::new(&path.to_string_lossy(), fourcc, 10.0, Size::new(160, 120), true)?;
    if !writer.is_opened()? {
        return Ok(None);
    }
    for i in 0..count {
        writer.write(&create_test_frame(120, 160, (i * 20) as f64)?)?;
    }
    writer.release()?;
    Ok(Some(()))
}

fn scripted(counts: &[usize]) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Box::new(ScriptedDetector::new(counts)),
        Box::new(CountingPoseEstimator::new(None)),
        PlayerTracker::default(),
        MetricsScope::Shared,
    )
}

#[test]
fn test_process_video_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("clip.avi");
    if write_clip(&input, 5)?.is_none() {
        eprintln!("MJPG encoding unavailable, skipping");
        return Ok(());
    }

    let mut orchestrator = scripted(&[1, 2, 0, 1, 1]);
    let output = tracked_output_path(&dir.path().join("nested"), &input);
    let results = orchestrator.process_video(&input, Some(&output), 3);

    assert_eq!(results.len(), 3);
    assert_eq!(orchestrator.tracker().next_id(), 4);
    // The output directory is created on demand
    assert!(dir.path().join("nested").is_dir());

    if !output.exists() {
        eprintln!("mp4v encoding unavailable, skipping output checks");
        return Ok(());
    }
    let mut written = VideoFileSource::open(&output)?;
    assert_eq!(written.frame_size(), (160, 120));
    assert!((written.fps() - 10.0).abs() < 0.5);

    let mut frames = 0;
    while let Some(frame) = written.read_frame()? {
        assert_eq!(frame.size()?, Size::new(160, 120));
        frames += 1;
    }
    assert_eq!(frames, 3);
    Ok(())
}

#[test]
fn test_process_video_without_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("clip.avi");
    if write_clip(&input, 2)?.is_none() {
        return Ok(());
    }

    let mut orchestrator = scripted(&[0, 0]);
    let results = orchestrator.process_video(&input, None, 30);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.tracks.is_empty()));
    Ok(())
}

#[test]
fn test_mid_stream_failure_keeps_completed_frames() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("clip.avi");
    if write_clip(&input, 4)?.is_none() {
        return Ok(());
    }

    let mut orchestrator = PipelineOrchestrator::new(
        Box::new(ScriptedDetector::new(&[1, 1, 1, 1]).failing_on(3)),
        Box::new(CountingPoseEstimator::new(None)),
        PlayerTracker::default(),
        MetricsScope::Shared,
    );
    let results = orchestrator.process_video(&input, None, 30);

    assert_eq!(results.len(), 2);
    Ok(())
}

#[test]
fn test_output_naming_and_filtering() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let present = dir.path().join("Badminton_1.mp4");
    std::fs::write(&present, b"")?;
    let missing = dir.path().join("Cricket_Bowling_3.mp4");

    assert_eq!(existing_videos(&[missing, present.clone()]), vec![present.clone()]);
    assert_eq!(
        tracked_output_path(Path::new("outputs"), &present),
        PathBuf::from("outputs/tracked_Badminton_1.mp4")
    );
    Ok(())
}
