//! Frame sources and sinks.
//!
//! The pipeline reads frames through `FrameSource` and writes annotated
//! frames through `FrameSink`, so the same loop serves video files and
//! pre-decoded frames held in memory.

use crate::{constants::DEFAULT_FPS, Error, Result};
use log::{debug, warn};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Sequential reader of BGR frames
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying decoder fails
    fn read_frame(&mut self) -> Result<Option<Mat>>;

    /// Frames per second reported by the source
    fn fps(&self) -> f64;

    /// `(width, height)` in pixels
    fn frame_size(&self) -> (i32, i32);
}

/// Sequential writer of annotated frames
pub trait FrameSink {
    /// # Errors
    ///
    /// Returns an error if the frame cannot be encoded or written
    fn write_frame(&mut self, frame: &Mat) -> Result<()>;

    /// Flush and release the output
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the output fails
    fn finish(&mut self) -> Result<()>;
}

/// Video file decoded through `OpenCV`
pub struct VideoFileSource {
    capture: VideoCapture,
    fps: f64,
    size: (i32, i32),
}

impl VideoFileSource {
    /// Open a video file for reading
    ///
    /// # Errors
    ///
    /// Returns `Error::VideoError` if the file cannot be opened
    #[allow(clippy::cast_possible_truncation)]
    pub fn open(path: &Path) -> Result<Self> {
        let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::VideoError(format!(
                "Could not open video {}",
                path.display()
            )));
        }

        let mut fps = capture.get(videoio::CAP_PROP_FPS)?;
        if !fps.is_finite() || fps <= 0.0 {
            warn!("Video {} reports no frame rate, using {DEFAULT_FPS}", path.display());
            fps = DEFAULT_FPS;
        }
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        debug!("Opened {} ({width}x{height} @ {fps:.2} fps)", path.display());

        Ok(Self {
            capture,
            fps,
            size: (width, height),
        })
    }
}

impl FrameSource for VideoFileSource {
    fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_size(&self) -> (i32, i32) {
        self.size
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release video capture: {e}");
        }
    }
}

/// `mp4v`-encoded video file writer
pub struct VideoFileSink {
    writer: VideoWriter,
    path: PathBuf,
    released: bool,
}

impl VideoFileSink {
    /// Create an output video with the given frame rate and size
    ///
    /// # Errors
    ///
    /// Returns `Error::VideoError` if the writer cannot be opened
    pub fn create(path: &Path, fps: f64, frame_size: (i32, i32)) -> Result<Self> {
        crate::utils::ensure_parent_dir(path)?;

        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            &path.to_string_lossy(),
            fourcc,
            fps,
            Size::new(frame_size.0, frame_size.1),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(Error::VideoError(format!(
                "Could not open video writer for {}",
                path.display()
            )));
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            released: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.writer.release()?;
        }
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Failed to release writer for {}: {e}", self.path.display());
        }
    }
}

/// Pre-decoded frames served in order
pub struct MemorySource {
    frames: VecDeque<Mat>,
    fps: f64,
    size: (i32, i32),
}

impl MemorySource {
    #[must_use]
    pub fn new(frames: Vec<Mat>, fps: f64) -> Self {
        let size = frames.first().map_or((0, 0), |f| (f.cols(), f.rows()));
        Self {
            frames: frames.into(),
            fps,
            size,
        }
    }

    /// Frames not yet read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn read_frame(&mut self) -> Result<Option<Mat>> {
        Ok(self.frames.pop_front())
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_size(&self) -> (i32, i32) {
        self.size
    }
}

/// Collects written frames in memory
#[derive(Default)]
pub struct MemorySink {
    pub frames: Vec<Mat>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        self.frames.push(frame.try_clone()?);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    #[test]
    fn test_memory_source_order() {
        let frames: Vec<Mat> = (0..3)
            .map(|i| Mat::new_rows_cols_with_default(4, 6, CV_8UC3, Scalar::all(f64::from(i))).unwrap())
            .collect();
        let mut source = MemorySource::new(frames, 25.0);

        assert_eq!(source.frame_size(), (6, 4));
        assert_eq!(source.fps(), 25.0);

        let mut seen = 0;
        while let Some(frame) = source.read_frame().unwrap() {
            assert_eq!(*frame.at_2d::<opencv::core::Vec3b>(0, 0).unwrap(), opencv::core::Vec3b::all(seen));
            seen += 1;
        }
        assert_eq!(seen, 3);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(VideoFileSource::open(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
