#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod imagegen;
mod loader;
pub mod placeholder;
pub mod server;
pub mod telemetry;
pub mod upload;

use serde::Deserialize;

pub use cors::*;
pub use imagegen::*;
pub use placeholder::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use upload::*;

/// Top-level Remix configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload validation and normalization limits
    #[serde(default)]
    pub upload: UploadConfig,
    /// Upstream text-to-image provider
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Placeholder rendering
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
