use std::path::PathBuf;

use serde::Deserialize;

/// Fonts used when drawing placeholder images
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// TrueType font for the title line
    #[serde(default = "default_bold_font")]
    pub bold_font: PathBuf,
    /// TrueType font for the wrapped prompt text
    #[serde(default = "default_regular_font")]
    pub regular_font: PathBuf,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            bold_font: default_bold_font(),
            regular_font: default_regular_font(),
        }
    }
}

fn default_bold_font() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf")
}

fn default_regular_font() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
}
