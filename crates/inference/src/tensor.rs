//! Conversions between images and NCHW `f32` tensors.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use ndarray::{Array4, ArrayView4};

use crate::error::InferenceError;

/// Side length of the square sketch fed to the generator.
pub const SKETCH_SIZE: u32 = 256;

/// Channel count of the generated photo.
pub const PHOTO_CHANNELS: usize = 3;

/// Resize a grayscale sketch to 256x256 and normalize it to `[-1, 1]`.
///
/// Output shape: `[1, 1, 256, 256]`.
pub fn sketch_to_tensor(sketch: &GrayImage) -> Array4<f32> {
    let resized = imageops::resize(sketch, SKETCH_SIZE, SKETCH_SIZE, FilterType::Triangle);
    let side = SKETCH_SIZE as usize;

    Array4::from_shape_fn((1, 1, side, side), |(_, _, y, x)| {
        let value = resized.get_pixel(x as u32, y as u32)[0] as f32 / 255.0;
        (value - 0.5) / 0.5
    })
}

/// Convert a `[1, 3, H, W]` generator output in `[-1, 1]` to an RGB image.
pub fn tensor_to_rgb(output: ArrayView4<'_, f32>) -> Result<RgbImage, InferenceError> {
    let (batch, channels, height, width) = output.dim();
    if batch != 1 || channels != PHOTO_CHANNELS {
        return Err(InferenceError::Shape(format!(
            "expected [1, {PHOTO_CHANNELS}, H, W], got {:?}",
            output.shape()
        )));
    }

    let mut image = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        for c in 0..PHOTO_CHANNELS {
            let value = output[[0, c, y as usize, x as usize]] * 0.5 + 0.5;
            pixel[c] = (value.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
    Ok(image)
}

/// Resize a face crop to `size`x`size` and standardize each channel with
/// `(value - mean) / std`.
///
/// Output shape: `[1, 3, size, size]`.
pub fn face_to_tensor(face: &RgbImage, size: u32, mean: f32, std: f32) -> Array4<f32> {
    let resized = imageops::resize(face, size, size, FilterType::Triangle);
    let side = size as usize;

    Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        (resized.get_pixel(x as u32, y as u32)[c] as f32 - mean) / std
    })
}

/// View flat output data as a 4-D tensor, checking the reported shape.
pub fn view4<'a>(shape: &[usize], data: &'a [f32]) -> Result<ArrayView4<'a, f32>, InferenceError> {
    let [n, c, h, w] = shape else {
        return Err(InferenceError::Shape(format!(
            "expected a 4-D tensor, got {shape:?}"
        )));
    };
    ArrayView4::from_shape((*n, *c, *h, *w), data)
        .map_err(|e| InferenceError::Shape(format!("{shape:?}: {e}")))
}
