use serde::Deserialize;

/// Upload validation and normalization limits
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Largest accepted image file in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Longest side of the normalized image in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Lowercase file extensions accepted for upload
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_body_bytes: default_max_body_bytes(),
            max_dimension: default_max_dimension(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploadConfig {
    /// Whether the filename carries one of the allowed extensions
    pub fn allows_filename(&self, filename: &str) -> bool {
        filename.rsplit_once('.').is_some_and(|(_, extension)| {
            let extension = extension.to_ascii_lowercase();
            self.allowed_extensions.iter().any(|allowed| *allowed == extension)
        })
    }

    /// File size limit rendered in whole megabytes for client messages
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / (1024 * 1024)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_file_size() -> usize {
    5 << 20
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_body_bytes() -> usize {
    16 << 20
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_dimension() -> u32 {
    512
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp"].into_iter().map(str::to_string).collect()
}
