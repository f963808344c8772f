use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml(&raw)?;

        tracing::debug!(path = %path.display(), "configuration loaded");

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server_config()?;
        self.validate_upload_config()?;
        self.validate_imagegen_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let mount_path = &self.server.mount_path;

        if !mount_path.is_empty() && (!mount_path.starts_with('/') || mount_path.ends_with('/')) {
            anyhow::bail!("server.mount_path must be empty or start with '/' and not end with '/': `{mount_path}`");
        }

        if self.server.health.enabled && !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }

    fn validate_upload_config(&self) -> anyhow::Result<()> {
        let upload = &self.upload;

        if upload.allowed_extensions.is_empty() {
            anyhow::bail!("upload.allowed_extensions must not be empty");
        }

        if let Some(extension) = upload
            .allowed_extensions
            .iter()
            .find(|e| e.is_empty() || e.contains('.') || e.chars().any(|c| c.is_ascii_uppercase()))
        {
            anyhow::bail!("upload.allowed_extensions entries must be lowercase and without dots: `{extension}`");
        }

        if upload.max_file_size > upload.max_body_bytes {
            anyhow::bail!("upload.max_file_size must not exceed upload.max_body_bytes");
        }

        if upload.max_dimension == 0 {
            anyhow::bail!("upload.max_dimension must be greater than 0");
        }

        Ok(())
    }

    fn validate_imagegen_config(&self) -> anyhow::Result<()> {
        let imagegen = &self.imagegen;

        if imagegen.timeout_duration()?.is_zero() {
            anyhow::bail!("imagegen.timeout must be greater than 0");
        }

        if imagegen.parameters.width == 0 || imagegen.parameters.height == 0 {
            anyhow::bail!("imagegen.parameters width and height must be greater than 0");
        }

        if !matches!(imagegen.url.scheme(), "http" | "https") {
            anyhow::bail!("imagegen.url must use http or https: `{}`", imagegen.url);
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let Some(telemetry) = &self.telemetry else {
            return Ok(());
        };

        for exporter in [telemetry.metrics_exporter(), telemetry.tracing_exporter()].into_iter().flatten() {
            if exporter.export_interval_duration()?.is_zero() {
                anyhow::bail!("telemetry export_interval must be greater than 0");
            }
        }

        Ok(())
    }
}
