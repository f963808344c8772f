//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use remix_config::{
    Config, CorsConfig, ExecutionMode, HealthConfig, ImageGenConfig, PlaceholderConfig, ServerConfig, UploadConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder whose provider points at the given inference URL
    pub fn new(inference_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                upload: UploadConfig::default(),
                imagegen: ImageGenConfig {
                    url: inference_url.parse().expect("valid URL"),
                    timeout: "5s".to_owned(),
                    ..ImageGenConfig::default()
                },
                placeholder: PlaceholderConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Send a bearer token upstream
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.config.imagegen.api_key = Some(SecretString::from(key.to_owned()));
        self
    }

    /// Override the per-variant timeout
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        timeout.clone_into(&mut self.config.imagegen.timeout);
        self
    }

    /// Dispatch variants with the given execution mode
    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.config.imagegen.execution = execution;
        self
    }

    /// Forward the normalized upload to the provider
    pub fn with_reference_image(mut self) -> Self {
        self.config.imagegen.send_reference_image = true;
        self
    }

    /// Set the largest accepted image file
    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.config.upload.max_file_size = bytes;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
