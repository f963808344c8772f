use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
};
use remix_config::UploadConfig;

use crate::error::{ImageGenError, Result};

/// Multipart field carrying the image file
const IMAGE_FIELD: &str = "image";

/// Multipart field carrying the text description
const DESCRIPTION_FIELD: &str = "description";

/// File part of an upload as received
#[derive(Debug)]
pub struct UploadedFile {
    /// Filename declared by the client (may be empty)
    pub filename: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

/// Raw, unvalidated generation form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<UploadedFile>,
    pub description: Option<String>,
}

/// Upload that passed every input check
#[derive(Debug)]
pub struct ValidatedUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Trimmed, non-empty description
    pub description: String,
}

impl UploadForm {
    /// Apply the input checks in the order clients see them reported
    ///
    /// Nothing here touches the network, so a rejected upload never costs
    /// an inference call.
    pub fn validate(self, limits: &UploadConfig) -> Result<ValidatedUpload> {
        let image = self
            .image
            .ok_or_else(|| ImageGenError::InvalidUpload("No image was sent".to_string()))?;

        if image.filename.is_empty() {
            return Err(ImageGenError::InvalidUpload("No file was selected".to_string()));
        }

        let description = self.description.as_deref().map(str::trim).unwrap_or_default();

        if description.is_empty() {
            return Err(ImageGenError::InvalidUpload("A description is required".to_string()));
        }

        if !limits.allows_filename(&image.filename) {
            return Err(ImageGenError::InvalidUpload("Unsupported file format".to_string()));
        }

        if image.bytes.len() > limits.max_file_size {
            return Err(ImageGenError::InvalidUpload(format!(
                "File is too large (max {}MB)",
                limits.max_file_size_mb()
            )));
        }

        Ok(ValidatedUpload {
            filename: image.filename,
            bytes: image.bytes,
            description: description.to_string(),
        })
    }
}

/// Extractor for the `image` + `description` multipart form
///
/// Unknown fields are skipped. The request body is bounded by the
/// `DefaultBodyLimit` layer installed on the generation route.
pub struct ExtractUpload(pub UploadForm);

impl<S> FromRequest<S> for ExtractUpload
where
    S: Send + Sync,
{
    type Rejection = ImageGenError;

    async fn from_request(request: http::Request<Body>, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| ImageGenError::InvalidUpload(format!("Failed to parse multipart form: {}", e.body_text())))?;

        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ImageGenError::InvalidUpload(format!("Failed to parse multipart form: {}", e.body_text())))?
        {
            let field_name = field.name().unwrap_or_default().to_string();

            match field_name.as_str() {
                IMAGE_FIELD => {
                    // A part without a filename is a plain text field, not a file
                    let Some(filename) = field.file_name().map(ToString::to_string) else {
                        continue;
                    };
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ImageGenError::InvalidUpload(format!("Failed to read image data: {}", e.body_text())))?;

                    form.image = Some(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                DESCRIPTION_FIELD => {
                    let text = field.text().await.map_err(|e| {
                        ImageGenError::InvalidUpload(format!("Failed to read description field: {}", e.body_text()))
                    })?;

                    form.description = Some(text);
                }
                _ => {
                    // Skip unknown fields
                }
            }
        }

        Ok(Self(form))
    }
}
