//! Decoding, downscaling, and transport encoding of raster images

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, ImageResult, RgbImage, imageops::FilterType};

/// Upload decoded to RGB and bounded in size
#[derive(Debug)]
pub struct NormalizedImage {
    pub image: RgbImage,
    /// PNG encoding of `image`, base64 text
    pub png_base64: String,
}

/// Decode an upload, convert it to RGB, and cap its longer side
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable raster image
pub fn normalize(bytes: &[u8], max_dimension: u32) -> ImageResult<NormalizedImage> {
    let rgb = image::load_from_memory(bytes)?.into_rgb8();
    let image = fit_within(rgb, max_dimension);
    let png_base64 = encode_png_base64(&image)?;

    Ok(NormalizedImage { image, png_base64 })
}

/// Downscale so neither side exceeds `max_dimension`, keeping aspect ratio
///
/// Images already within bounds are returned untouched.
pub fn fit_within(image: RgbImage, max_dimension: u32) -> RgbImage {
    let (width, height) = image.dimensions();

    if width <= max_dimension && height <= max_dimension {
        return image;
    }

    let (new_width, new_height) = scaled_dimensions(width, height, max_dimension);
    image::imageops::resize(&image, new_width, new_height, FilterType::Lanczos3)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max = f64::from(max_dimension);
    let ratio = (max / f64::from(width)).min(max / f64::from(height));

    let scale = |side: u32| ((f64::from(side) * ratio).floor() as u32).max(1);

    (scale(width), scale(height))
}

/// Re-encode arbitrary image bytes (e.g. an upstream JPEG) as base64 PNG
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded or encoded
pub fn reencode_png_base64(bytes: &[u8]) -> ImageResult<String> {
    let decoded = image::load_from_memory(bytes)?;
    encode_dynamic_png_base64(&decoded)
}

/// Encode an RGB image as base64 PNG
///
/// # Errors
///
/// Returns an error if PNG encoding fails
pub fn encode_png_base64(image: &RgbImage) -> ImageResult<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(BASE64.encode(png))
}

fn encode_dynamic_png_base64(image: &DynamicImage) -> ImageResult<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(BASE64.encode(png))
}
