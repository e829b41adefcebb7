//! Player detection: the `Detector` seam and a YOLOv8 `ONNX` implementation.

use crate::{
    bbox::BoundingBox,
    constants::{DETECTOR_PAD_VALUE, DEFAULT_DETECTOR_INPUT_SIZE, PERSON_CLASS_ID, PERSON_CLASS_NAME},
    utils::image_conversion::{bgr_to_rgb_f32, letterbox, mat_to_nchw, Letterbox},
    Error, Result,
};
use ndarray::{Array2, ArrayView2, Axis, CowArray, Ix2};
use opencv::core::Mat;
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A single localized, scored player box for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box corners in frame pixels
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    /// Class label, always the target class
    pub class_name: String,
}

impl Detection {
    #[must_use]
    pub fn person(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence,
            class_name: PERSON_CLASS_NAME.to_string(),
        }
    }
}

/// Anything that turns a BGR frame into ordered player detections
pub trait Detector {
    /// Detect players in a single frame.
    ///
    /// The returned order is the order tracks are numbered in.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails
    fn detect_players(&mut self, frame: &Mat) -> Result<Vec<Detection>>;
}

/// YOLOv8 person detector using `ONNX` Runtime
///
/// Expects the standard Ultralytics export: input `[1, 3, S, S]` RGB in
/// `[0, 1]`, output `[1, 4 + classes, anchors]` with `cx, cy, w, h` rows
/// followed by per-class scores.
pub struct YoloDetector {
    session: Session,
    input_size: i32,
    conf_threshold: f32,
    nms_threshold: f32,
    class_id: usize,
}

impl YoloDetector {
    /// Load a detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, conf_threshold: f32, nms_threshold: f32) -> Result<Self> {
        log::info!(
            "Loading YOLO model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("player_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // [batch, channels, height, width]; dynamic axes fall back to the default size
        let input_size = input_meta
            .dimensions
            .get(2)
            .copied()
            .flatten()
            .and_then(|d| i32::try_from(d).ok())
            .unwrap_or(DEFAULT_DETECTOR_INPUT_SIZE);

        log::info!("YOLO model loaded, input size {input_size}x{input_size}");

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            class_id: PERSON_CLASS_ID,
        })
    }

    /// Model input side length in pixels
    #[must_use]
    pub fn input_size(&self) -> i32 {
        self.input_size
    }

    fn forward(&self, frame: &Mat) -> Result<(Array2<f32>, Letterbox)> {
        let boxed = letterbox(frame, self.input_size, DETECTOR_PAD_VALUE)?;
        let rgb = bgr_to_rgb_f32(&boxed.image, 1.0 / 255.0)?;
        let input = mat_to_nchw(&rgb)?;

        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let tensor = output.try_extract::<f32>()?;
        let view = tensor.view();

        // Drop the batch axis: [1, 4 + C, A] -> [4 + C, A]
        if view.ndim() != 3 || view.shape()[0] != 1 {
            return Err(Error::ModelDataFormatError(format!(
                "Unexpected detector output shape {:?}",
                view.shape()
            )));
        }
        let predictions = view
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| Error::ModelDataFormatError(e.to_string()))?
            .to_owned();

        Ok((predictions, boxed))
    }
}

impl Detector for YoloDetector {
    fn detect_players(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        let (predictions, boxed) = self.forward(frame)?;
        let candidates = decode_predictions(
            predictions.view(),
            &boxed,
            (frame.cols(), frame.rows()),
            self.class_id,
            self.conf_threshold,
        )?;
        Ok(non_max_suppression(candidates, self.nms_threshold))
    }
}

/// Turn raw `[4 + C, A]` predictions into target-class detections in frame pixels.
///
/// An anchor is kept when its best-scoring class is `class_id` and that score
/// is strictly above `conf_threshold`.
///
/// # Errors
///
/// Returns an error if the prediction matrix has fewer than 5 rows
#[allow(clippy::cast_precision_loss)]
pub fn decode_predictions(
    predictions: ArrayView2<'_, f32>,
    boxed: &Letterbox,
    frame_size: (i32, i32),
    class_id: usize,
    conf_threshold: f32,
) -> Result<Vec<Detection>> {
    let rows = predictions.shape()[0];
    if rows < 5 || class_id >= rows - 4 {
        return Err(Error::ModelDataFormatError(format!(
            "Detector output has {rows} rows, cannot hold class {class_id}"
        )));
    }

    let (frame_w, frame_h) = (frame_size.0 as f32, frame_size.1 as f32);
    let mut detections = Vec::new();

    for anchor in predictions.axis_iter(Axis(1)) {
        let scores = anchor.slice(ndarray::s![4..]);
        let (best_class, best_score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (idx, s)| if s > best.1 { (idx, s) } else { best });

        if best_class != class_id || best_score <= conf_threshold {
            continue;
        }

        let model_box = BoundingBox::from_cxcywh(anchor[0], anchor[1], anchor[2], anchor[3]);
        let (x1, y1) = boxed.to_source(model_box.x1, model_box.y1);
        let (x2, y2) = boxed.to_source(model_box.x2, model_box.y2);
        let bbox = BoundingBox::new(x1, y1, x2, y2).clip(frame_w, frame_h);

        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            continue;
        }

        detections.push(Detection::person(bbox, best_score));
    }

    Ok(detections)
}

/// Greedy non-maximum suppression; survivors come back by descending confidence
#[must_use]
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}
