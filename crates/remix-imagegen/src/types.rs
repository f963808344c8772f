use serde::{Deserialize, Serialize};

/// Envelope shared by the generation and test endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateResponse {
    /// Always `true`; failures use [`ErrorResponse`] instead
    pub success: bool,
    /// Base64-encoded PNG images, one per prompt variant, in prompt order
    pub images: Vec<String>,
    /// Human-readable summary
    pub message: String,
}

/// Body of every 4xx/5xx response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
