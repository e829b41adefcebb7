//! Frame overlay rendering: detection boxes, skeletons, track ids and timing text.

use crate::{
    bbox::BoundingBox,
    detection::Detection,
    metrics::{PerformanceMetrics, Stage},
    pose::{Pose, PoseEstimator},
    tracking::Track,
    utils::safe_cast::pixel_coord,
    Result,
};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

/// BGR colors cycled by track id
pub const TRACK_PALETTE: [(f64, f64, f64); 6] = [
    (255.0, 0.0, 0.0),
    (0.0, 255.0, 0.0),
    (0.0, 0.0, 255.0),
    (255.0, 255.0, 0.0),
    (255.0, 0.0, 255.0),
    (0.0, 255.0, 255.0),
];

const DETECTION_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const TEXT_COLOR: (f64, f64, f64) = (255.0, 255.0, 255.0);

fn scalar((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// Palette entry for a track id
#[must_use]
pub fn track_color(track_id: u64) -> Scalar {
    // Palette length fits in u64 and the remainder fits in usize
    #[allow(clippy::cast_possible_truncation)]
    let idx = (track_id % TRACK_PALETTE.len() as u64) as usize;
    scalar(TRACK_PALETTE[idx])
}

/// Draws pipeline results over a copy of the input frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAnnotator;

impl FrameAnnotator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render detections, poses, tracks and the timing overlay.
    ///
    /// `frame` is left untouched; identical inputs give identical output.
    ///
    /// # Errors
    ///
    /// Returns an error if cloning the frame or any drawing call fails
    pub fn annotate(
        &self,
        frame: &Mat,
        detections: &[Detection],
        poses: &[Pose],
        tracks: &[Track],
        skeleton: &dyn PoseEstimator,
        metrics: &PerformanceMetrics,
    ) -> Result<Mat> {
        let mut annotated = frame.try_clone()?;

        for det in detections {
            draw_box(&mut annotated, &det.bbox, scalar(DETECTION_COLOR))?;
        }

        skeleton.draw_poses(&mut annotated, poses)?;

        self.draw_tracks(&mut annotated, tracks)?;

        if !metrics.is_empty() {
            self.draw_timing(&mut annotated, metrics, tracks.len())?;
        }

        Ok(annotated)
    }

    fn draw_tracks(&self, frame: &mut Mat, tracks: &[Track]) -> Result<()> {
        for track in tracks {
            let color = track_color(track.track_id);
            draw_box(frame, &track.bbox, color)?;

            let label = format!("ID: {}", track.track_id);
            let origin = Point::new(pixel_coord(track.bbox.x1), pixel_coord(track.bbox.y1) - 10);
            imgproc::put_text(frame, &label, origin, FONT_HERSHEY_SIMPLEX, 0.5, color, 2, LINE_8, false)?;
        }
        Ok(())
    }

    fn draw_timing(&self, frame: &mut Mat, metrics: &PerformanceMetrics, players: usize) -> Result<()> {
        let lines = [
            format!("Detection: {:.1}ms", metrics.recent_mean_ms(Stage::Detection)),
            format!("Pose: {:.1}ms", metrics.recent_mean_ms(Stage::Pose)),
            format!("Tracking: {:.1}ms", metrics.recent_mean_ms(Stage::Tracking)),
            format!("Players: {players}"),
        ];

        for (row, text) in (0..).zip(lines.iter()) {
            imgproc::put_text(
                frame,
                text,
                Point::new(10, 30 + row * 25),
                FONT_HERSHEY_SIMPLEX,
                0.6,
                scalar(TEXT_COLOR),
                2,
                LINE_8,
                false,
            )?;
        }
        Ok(())
    }
}

fn draw_box(frame: &mut Mat, bbox: &BoundingBox, color: Scalar) -> Result<()> {
    imgproc::rectangle_points(frame, bbox.top_left(), bbox.bottom_right(), color, 2, LINE_8, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_color_cycles() {
        assert_eq!(track_color(1), scalar((0.0, 255.0, 0.0)));
        assert_eq!(track_color(6), scalar((255.0, 0.0, 0.0)));
        assert_eq!(track_color(7), track_color(1));
    }
}
