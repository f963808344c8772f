use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default Hugging Face inference endpoint (Stable Diffusion v1.5)
pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/runwayml/stable-diffusion-v1-5";

/// Upstream text-to-image provider configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Provider type
    #[serde(rename = "type", default)]
    pub provider_type: ImageGenProviderType,
    /// Inference endpoint the prompts are posted to
    #[serde(default = "default_url")]
    pub url: Url,
    /// Bearer token; an empty or missing token omits the header
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Per-variant request timeout (e.g. "60s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// How the variants of one request are dispatched
    #[serde(default)]
    pub execution: ExecutionMode,
    /// Forward the normalized upload alongside the prompt
    #[serde(default)]
    pub send_reference_image: bool,
    /// Sampling parameters sent with every prompt
    #[serde(default)]
    pub parameters: GenerationParameters,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            provider_type: ImageGenProviderType::default(),
            url: default_url(),
            api_key: None,
            timeout: default_timeout(),
            execution: ExecutionMode::default(),
            send_reference_image: false,
            parameters: GenerationParameters::default(),
        }
    }
}

impl ImageGenConfig {
    /// Parse the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn timeout_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.timeout)
            .map_err(|e| anyhow::anyhow!("invalid imagegen.timeout '{}': {e}", self.timeout))
    }
}

/// Supported text-to-image providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageGenProviderType {
    /// Hugging Face serverless inference API
    #[default]
    Huggingface,
}

/// Dispatch strategy for the variants of a single request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One upstream call at a time, in prompt order
    #[default]
    Sequential,
    /// All upstream calls in flight together, joined before responding
    Concurrent,
}

/// Sampling parameters for the upstream model
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationParameters {
    #[serde(default = "default_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            num_inference_steps: default_steps(),
            guidance_scale: default_guidance_scale(),
            width: default_side(),
            height: default_side(),
        }
    }
}

fn default_url() -> Url {
    Url::parse(DEFAULT_INFERENCE_URL).expect("must be valid URL")
}

fn default_timeout() -> String {
    "60s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_steps() -> u32 {
    20
}

#[allow(clippy::missing_const_for_fn)]
fn default_guidance_scale() -> f32 {
    7.5
}

#[allow(clippy::missing_const_for_fn)]
fn default_side() -> u32 {
    512
}
