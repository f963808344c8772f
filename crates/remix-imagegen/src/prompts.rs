/// Number of variants generated per request
pub const VARIANT_COUNT: usize = 4;

/// Style descriptors appended to the description, one per variant
const STYLE_SUFFIXES: [&str; VARIANT_COUNT] = [
    "cartoon style, funny, colorful",
    "meme style, humorous, bold colors",
    "comic book style, exaggerated features",
    "digital art, vibrant, entertaining",
];

/// One style-augmented prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptVariant {
    /// 1-based position, used in labels and logs
    pub number: usize,
    pub prompt: String,
}

/// Expand a description into the fixed set of styled prompts
pub fn expand(description: &str) -> Vec<PromptVariant> {
    STYLE_SUFFIXES
        .iter()
        .enumerate()
        .map(|(index, suffix)| PromptVariant {
            number: index + 1,
            prompt: format!("{description}, {suffix}"),
        })
        .collect()
}
