//! Upload payloads and response decoding helpers

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};

/// Encode a solid-colour RGB image of the given size as PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding should succeed");
    bytes
}

/// Form with an image part and a description
pub fn upload(filename: &str, bytes: Vec<u8>, description: &str) -> Form {
    Form::new()
        .part("image", Part::bytes(bytes).file_name(filename.to_owned()))
        .text("description", description.to_owned())
}

/// Decode a base64 PNG from a response
pub fn decode(image: &str) -> DynamicImage {
    let bytes = STANDARD.decode(image).expect("image should be valid base64");
    assert!(bytes.starts_with(b"\x89PNG"), "image should be a PNG");
    image::load_from_memory(&bytes).expect("image should decode")
}
