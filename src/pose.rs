//! Single-person body pose estimation.
//!
//! The `PoseEstimator` trait is the seam the pipeline talks to: it yields at
//! most one pose per frame and knows how to draw its own skeleton. The
//! bundled implementation runs a MoveNet single-pose model through `ONNX`
//! Runtime and reports the 17 COCO body keypoints.

use crate::{
    constants::{DEFAULT_POSE_INPUT_SIZE, KEYPOINT_VISIBILITY_THRESHOLD, NUM_BODY_KEYPOINTS},
    utils::image_conversion::{bgr_to_rgb_f32, letterbox, mat_to_nhwc, Letterbox},
    utils::safe_cast::pixel_coord,
    Error, Result,
};
use ndarray::{Array4, ArrayViewD, CowArray};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FILLED, LINE_8},
    prelude::*,
};
use ort::{tensor::TensorElementDataType, Environment, Session, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Skeleton edges over the COCO keypoint order
/// (nose, eyes, ears, shoulders, elbows, wrists, hips, knees, ankles)
pub const COCO_SKELETON: [(usize, usize); 16] = [
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 11),
    (6, 12),
    (11, 12),
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    (11, 13),
    (12, 14),
    (13, 15),
    (14, 16),
];

/// One set of body landmarks for a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// `(x, y)` in frame pixels, in model keypoint order
    pub keypoints: Vec<[f32; 2]>,
    /// Per-keypoint visibility in `[0, 1]`, parallel to `keypoints`
    pub scores: Vec<f32>,
}

impl Pose {
    /// Mean keypoint visibility, 0 for an empty pose
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_score(&self) -> f32 {
        if self.scores.is_empty() {
            0.0
        } else {
            self.scores.iter().sum::<f32>() / self.scores.len() as f32
        }
    }

    fn visible_point(&self, idx: usize) -> Option<Point> {
        let score = *self.scores.get(idx)?;
        if score < KEYPOINT_VISIBILITY_THRESHOLD {
            return None;
        }
        let [x, y] = *self.keypoints.get(idx)?;
        Some(Point::new(pixel_coord(x), pixel_coord(y)))
    }
}

/// Pose model seam used by the pipeline and the annotator
pub trait PoseEstimator {
    /// Estimate the pose in a frame, if any
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails
    fn process_frame(&mut self, frame: &Mat) -> Result<Option<Pose>>;

    /// Keypoint index pairs joined when drawing
    fn skeleton(&self) -> &[(usize, usize)] {
        &COCO_SKELETON
    }

    /// Draw skeletons onto `frame`: edges in red, joints in green.
    /// Keypoints below the visibility threshold are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an `OpenCV` drawing call fails
    fn draw_poses(&self, frame: &mut Mat, poses: &[Pose]) -> Result<()> {
        let edge_color = Scalar::new(0.0, 0.0, 255.0, 0.0);
        let joint_color = Scalar::new(0.0, 255.0, 0.0, 0.0);

        for pose in poses {
            for &(a, b) in self.skeleton() {
                if let (Some(pa), Some(pb)) = (pose.visible_point(a), pose.visible_point(b)) {
                    imgproc::line(frame, pa, pb, edge_color, 2, LINE_8, 0)?;
                }
            }
            for idx in 0..pose.keypoints.len() {
                if let Some(p) = pose.visible_point(idx) {
                    imgproc::circle(frame, p, 2, joint_color, FILLED, LINE_8, 0)?;
                }
            }
        }
        Ok(())
    }
}

/// MoveNet single-pose estimator using `ONNX` Runtime
///
/// Expects input `[1, S, S, 3]` RGB in `[0, 255]`, either float32 or int32
/// as declared by the model, and output `[1, 1, 17, 3]` holding normalized
/// `(y, x, score)` per keypoint.
pub struct MoveNetEstimator {
    session: Session,
    input_size: i32,
    input_kind: InputKind,
    min_pose_confidence: f32,
}

/// Element type of the pose model's image input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Float32,
    Int32,
}

impl InputKind {
    /// Map a declared tensor element type onto a supported input kind
    ///
    /// # Errors
    ///
    /// Returns `Error::ModelError` for any element type other than
    /// float32 or int32
    pub fn from_element_type(element_type: TensorElementDataType) -> Result<Self> {
        match element_type {
            TensorElementDataType::Float32 => Ok(Self::Float32),
            TensorElementDataType::Int32 => Ok(Self::Int32),
            other => Err(Error::ModelError(format!(
                "Unsupported pose model input type {other:?}, expected float32 or int32"
            ))),
        }
    }
}

impl MoveNetEstimator {
    /// Load a pose model from an `ONNX` file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs
    /// - The model input is neither float32 nor int32
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, min_pose_confidence: f32) -> Result<Self> {
        log::info!(
            "Initializing pose model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_estimator")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;
        let input_kind = InputKind::from_element_type(input.input_type)?;

        // [batch, height, width, channels]
        let input_size = input
            .dimensions
            .get(1)
            .copied()
            .flatten()
            .and_then(|d| i32::try_from(d).ok())
            .unwrap_or(DEFAULT_POSE_INPUT_SIZE);
        log::debug!("Pose model input: {input_size}x{input_size} {input_kind:?}");

        Ok(Self {
            session,
            input_size,
            input_kind,
            min_pose_confidence,
        })
    }
}

impl PoseEstimator for MoveNetEstimator {
    fn process_frame(&mut self, frame: &Mat) -> Result<Option<Pose>> {
        let boxed = letterbox(frame, self.input_size, 0.0)?;
        let rgb = bgr_to_rgb_f32(&boxed.image, 1.0)?;
        let input = mat_to_nhwc(&rgb)?;

        let outputs = match self.input_kind {
            InputKind::Float32 => {
                let cow_array = CowArray::from(input.into_dyn());
                let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
                self.session.run(vec![input_tensor])?
            }
            InputKind::Int32 => {
                let cow_array = CowArray::from(to_int_pixels(&input).into_dyn());
                let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
                self.session.run(vec![input_tensor])?
            }
        };

        let output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let tensor = output.try_extract::<f32>()?;

        let pose = decode_keypoints(tensor.view(), &boxed, self.input_size)?;
        if pose.mean_score() >= self.min_pose_confidence {
            Ok(Some(pose))
        } else {
            Ok(None)
        }
    }
}

/// Round `[0, 255]` float pixels to the int32 layout some exports declare
#[allow(clippy::cast_possible_truncation)]
fn to_int_pixels(input: &Array4<f32>) -> Array4<i32> {
    input.mapv(|v| v.round().clamp(0.0, 255.0) as i32)
}

/// Convert a `[.., 17, 3]` MoveNet output into frame-pixel keypoints
///
/// # Errors
///
/// Returns an error if the output does not hold 17 `(y, x, score)` triples
#[allow(clippy::cast_precision_loss)]
pub fn decode_keypoints(output: ArrayViewD<'_, f32>, boxed: &Letterbox, input_size: i32) -> Result<Pose> {
    let values: Vec<f32> = output.iter().copied().collect();
    if values.len() != NUM_BODY_KEYPOINTS * 3 {
        return Err(Error::ModelDataFormatError(format!(
            "Expected {} pose values, got {} (shape {:?})",
            NUM_BODY_KEYPOINTS * 3,
            values.len(),
            output.shape()
        )));
    }

    let side = input_size as f32;
    let mut keypoints = Vec::with_capacity(NUM_BODY_KEYPOINTS);
    let mut scores = Vec::with_capacity(NUM_BODY_KEYPOINTS);

    for triple in values.chunks_exact(3) {
        let (x, y) = boxed.to_source(triple[1] * side, triple[0] * side);
        keypoints.push([x, y]);
        scores.push(triple[2].clamp(0.0, 1.0));
    }

    Ok(Pose { keypoints, scores })
}
