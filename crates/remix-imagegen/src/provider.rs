pub(crate) mod huggingface;

use async_trait::async_trait;
use thiserror::Error;

/// One upstream generation call
#[derive(Debug, Clone, Copy)]
pub struct VariantRequest<'a> {
    /// Style-augmented prompt
    pub prompt: &'a str,
    /// Normalized upload as base64 PNG, for providers that condition on it
    pub reference_image: Option<&'a str>,
}

/// Why a single variant fell back to a placeholder
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream answered with something other than 200
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// Request did not complete within the configured timeout
    #[error("upstream request timed out")]
    Timeout,

    /// Network or protocol failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Upstream returned bytes that are not a usable image
    #[error("invalid image from upstream: {0}")]
    InvalidImage(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Connection(e.to_string())
        }
    }
}

/// Trait for text-to-image provider implementations
#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Run one generation and return the raw image bytes
    async fn generate(&self, request: VariantRequest<'_>) -> Result<Vec<u8>, ProviderError>;

    /// Get the provider name
    fn name(&self) -> &str;
}
