//! Frame preprocessing shared by the detector and the pose model.

use crate::utils::safe_cast::{f32_to_i32_clamp, i32_to_usize};
use crate::{Error, Result};
use ndarray::Array4;
use opencv::core::{self, Mat, Scalar, Size, Vec3f, BORDER_CONSTANT, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;

/// A frame resized into a square model input with centered padding
pub struct Letterbox {
    /// Padded `size` x `size` image, same type as the source
    pub image: Mat,
    /// Source-to-model scale factor
    pub scale: f32,
    /// Left padding in model pixels
    pub pad_x: i32,
    /// Top padding in model pixels
    pub pad_y: i32,
}

impl Letterbox {
    /// Map a point in model pixels back to source-frame pixels
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }
}

/// Resize `image` to fit a `size` x `size` square, keeping aspect ratio
///
/// # Errors
///
/// Returns an error if the image is empty or `OpenCV` fails to resize/pad it
#[allow(clippy::cast_precision_loss)]
pub fn letterbox(image: &Mat, size: i32, pad_value: f64) -> Result<Letterbox> {
    let (width, height) = (image.cols(), image.rows());
    if width <= 0 || height <= 0 || size <= 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot letterbox {width}x{height} image into {size}x{size}"
        )));
    }

    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_width = f32_to_i32_clamp((width as f32 * scale).round(), 1, size);
    let new_height = f32_to_i32_clamp((height as f32 * scale).round(), 1, size);

    let mut resized = Mat::default();
    imgproc::resize(
        image,
        &mut resized,
        Size::new(new_width, new_height),
        0.0,
        0.0,
        InterpolationFlags::INTER_LINEAR as i32,
    )?;

    let pad_x = (size - new_width) / 2;
    let pad_y = (size - new_height) / 2;

    let mut padded = Mat::default();
    core::copy_make_border(
        &resized,
        &mut padded,
        pad_y,
        size - new_height - pad_y,
        pad_x,
        size - new_width - pad_x,
        BORDER_CONSTANT,
        Scalar::all(pad_value),
    )?;

    Ok(Letterbox {
        image: padded,
        scale,
        pad_x,
        pad_y,
    })
}

/// Convert a BGR `CV_8UC3` image to RGB `CV_32FC3`, multiplying by `scale`
///
/// # Errors
///
/// Returns an error if color conversion fails
pub fn bgr_to_rgb_f32(image: &Mat, scale: f64) -> Result<Mat> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(image, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    let mut float_image = Mat::default();
    rgb.convert_to(&mut float_image, CV_32F, scale, 0.0)?;
    Ok(float_image)
}

/// Copy a `CV_32FC3` image into a `[1, H, W, 3]` tensor
///
/// # Errors
///
/// Returns an error if the image is not a continuous 3-channel float image
pub fn mat_to_nhwc(image: &Mat) -> Result<Array4<f32>> {
    let height = i32_to_usize(image.rows())?;
    let width = i32_to_usize(image.cols())?;

    if image.channels() != 3 {
        return Err(Error::InvalidInput(format!(
            "Expected 3 channels, got {}",
            image.channels()
        )));
    }

    let pixels = image.data_typed::<Vec3f>()?;
    let data: Vec<f32> = pixels.iter().flat_map(|px| [px[0], px[1], px[2]]).collect();

    Array4::from_shape_vec((1, height, width, 3), data)
        .map_err(|e| Error::ModelDataFormatError(format!("Failed to create array: {e}")))
}

/// Copy a `CV_32FC3` image into a contiguous `[1, 3, H, W]` tensor
///
/// # Errors
///
/// Returns an error if the image is not a continuous 3-channel float image
pub fn mat_to_nchw(image: &Mat) -> Result<Array4<f32>> {
    let nhwc = mat_to_nhwc(image)?;
    Ok(nhwc.permuted_axes([0, 3, 1, 2]).as_standard_layout().to_owned())
}
