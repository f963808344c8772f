use std::{sync::Arc, time::Instant};

use image::ImageResult;
use remix_config::{ExecutionMode, ImageGenProviderType, UploadConfig};
use remix_telemetry::metrics::GenerationMetrics;
use tokio::task::spawn_blocking;

use crate::{
    error::{ImageGenError, Result},
    http_client::http_client,
    normalize::{encode_png_base64, normalize, reencode_png_base64},
    placeholder::PlaceholderRenderer,
    prompts::{self, PromptVariant, VARIANT_COUNT},
    provider::{ImageGenProvider, ProviderError, VariantRequest, huggingface::HuggingFaceProvider},
    types::GenerateResponse,
    upload::ValidatedUpload,
};

/// Label and prompt text used by the test endpoint
const TEST_PROMPT: &str = "Generated test image";

/// Where a variant's image came from
///
/// Never exposed to API consumers; logged and counted only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantOutcome {
    /// Produced by the upstream provider
    Generated,
    /// Drawn locally after the upstream call failed
    Placeholder,
}

impl VariantOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Placeholder => "placeholder",
        }
    }
}

/// One entry of the response, with its internal provenance
#[derive(Debug)]
pub struct GeneratedVariant {
    /// Base64 PNG
    pub image: String,
    pub outcome: VariantOutcome,
}

/// Image generation server: upload in, four variants out
pub struct Server {
    provider: Box<dyn ImageGenProvider>,
    placeholders: Arc<PlaceholderRenderer>,
    upload: UploadConfig,
    execution: ExecutionMode,
    metrics: GenerationMetrics,
    /// Turns upstream bytes into a base64 PNG
    reencode: Reencoder,
}

type Reencoder = fn(&[u8]) -> ImageResult<String>;

impl Server {
    /// Limits applied to incoming uploads
    pub fn upload_limits(&self) -> &UploadConfig {
        &self.upload
    }

    /// Normalize the upload, then produce one image per prompt variant
    ///
    /// Upstream failures never surface here: each failed variant is
    /// replaced by a placeholder so the response always carries
    /// [`VARIANT_COUNT`] images.
    pub async fn generate(&self, upload: ValidatedUpload) -> Result<GenerateResponse> {
        let start = Instant::now();

        tracing::info!(
            filename = %upload.filename,
            bytes = upload.bytes.len(),
            "generating variations"
        );

        let max_dimension = self.upload.max_dimension;
        let bytes = upload.bytes;
        let normalized = spawn_blocking(move || normalize(&bytes, max_dimension))
            .await?
            .map_err(|e| ImageGenError::ImageProcessing(e.to_string()))?;

        tracing::debug!(
            width = normalized.image.width(),
            height = normalized.image.height(),
            "upload normalized"
        );

        let variants = prompts::expand(&upload.description);
        let generated = self.generate_variants(&variants, &normalized.png_base64).await?;

        let placeholders = generated
            .iter()
            .filter(|v| v.outcome == VariantOutcome::Placeholder)
            .count();

        tracing::info!(
            variants = generated.len(),
            placeholders,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "variations complete"
        );
        self.metrics.record_request(start, "generate");

        let images: Vec<String> = generated.into_iter().map(|v| v.image).collect();

        Ok(GenerateResponse {
            success: true,
            message: format!("Generated {} variations successfully", images.len()),
            images,
        })
    }

    /// Placeholders only, without touching the upstream provider
    pub async fn test_images(&self) -> Result<GenerateResponse> {
        let mut images = Vec::with_capacity(VARIANT_COUNT);

        for number in 1..=VARIANT_COUNT {
            images.push(self.render_placeholder(format!("Test {number}"), TEST_PROMPT.to_string()).await?);
        }

        Ok(GenerateResponse {
            success: true,
            images,
            message: "Test generation succeeded".to_string(),
        })
    }

    /// Dispatch every variant according to the execution mode
    ///
    /// Output order always matches `variants`.
    pub(crate) async fn generate_variants(
        &self,
        variants: &[PromptVariant],
        reference_image: &str,
    ) -> Result<Vec<GeneratedVariant>> {
        match self.execution {
            ExecutionMode::Sequential => {
                let mut generated = Vec::with_capacity(variants.len());
                for variant in variants {
                    generated.push(self.generate_variant(variant, reference_image).await?);
                }
                Ok(generated)
            }
            ExecutionMode::Concurrent => {
                futures::future::try_join_all(
                    variants
                        .iter()
                        .map(|variant| self.generate_variant(variant, reference_image)),
                )
                .await
            }
        }
    }

    async fn generate_variant(&self, variant: &PromptVariant, reference_image: &str) -> Result<GeneratedVariant> {
        let request = VariantRequest {
            prompt: &variant.prompt,
            reference_image: Some(reference_image),
        };

        let result = match self.provider.generate(request).await {
            Ok(bytes) => {
                let reencode = self.reencode;
                // A decoder panic on upstream bytes only costs this variant
                match spawn_blocking(move || reencode(&bytes)).await {
                    Ok(encoded) => encoded.map_err(|e| ProviderError::InvalidImage(e.to_string())),
                    Err(e) => Err(ProviderError::InvalidImage(e.to_string())),
                }
            }
            Err(e) => Err(e),
        };

        let generated = match result {
            Ok(image) => {
                tracing::info!(variant = variant.number, provider = self.provider.name(), "variant generated");

                GeneratedVariant {
                    image,
                    outcome: VariantOutcome::Generated,
                }
            }
            Err(e) => {
                let label = match &e {
                    ProviderError::Status { status, body } => {
                        tracing::warn!(variant = variant.number, status, body = %body, "upstream rejected variant");
                        format!("Variation {}", variant.number)
                    }
                    other => {
                        tracing::warn!(variant = variant.number, error = %other, "variant generation failed");
                        format!("Error - Variation {}", variant.number)
                    }
                };

                GeneratedVariant {
                    image: self.render_placeholder(label, variant.prompt.clone()).await?,
                    outcome: VariantOutcome::Placeholder,
                }
            }
        };

        self.metrics.record_variant(generated.outcome.as_str());

        Ok(generated)
    }

    async fn render_placeholder(&self, label: String, prompt: String) -> Result<String> {
        let renderer = Arc::clone(&self.placeholders);

        spawn_blocking(move || encode_png_base64(&renderer.render(&label, &prompt)))
            .await?
            .map_err(|e| ImageGenError::Internal(e.to_string()))
    }
}

/// Builder for constructing the image generation server from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a remix_config::Config,
    provider: Option<Box<dyn ImageGenProvider>>,
    placeholders: Option<PlaceholderRenderer>,
    reencode: Reencoder,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a remix_config::Config) -> Self {
        Self {
            config,
            provider: None,
            placeholders: None,
            reencode: reencode_png_base64,
        }
    }

    /// Use a specific provider instead of the configured one
    #[cfg(test)]
    pub(crate) fn with_provider(mut self, provider: Box<dyn ImageGenProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a specific placeholder renderer instead of loading fonts
    #[cfg(test)]
    pub(crate) fn with_placeholders(mut self, placeholders: PlaceholderRenderer) -> Self {
        self.placeholders = Some(placeholders);
        self
    }

    /// Replace the step that re-encodes upstream images
    #[cfg(test)]
    pub(crate) fn with_reencoder(mut self, reencode: Reencoder) -> Self {
        self.reencode = reencode;
        self
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let imagegen = &self.config.imagegen;

        let provider = match self.provider {
            Some(provider) => provider,
            None => match imagegen.provider_type {
                ImageGenProviderType::Huggingface => {
                    let client = http_client(imagegen.timeout_duration()?)
                        .map_err(|e| anyhow::anyhow!("failed to build inference HTTP client: {e}"))?;

                    Box::new(HuggingFaceProvider::new(
                        client,
                        imagegen.url.clone(),
                        imagegen.api_key.clone(),
                        imagegen.parameters.clone(),
                        imagegen.send_reference_image,
                    )) as Box<dyn ImageGenProvider>
                }
            },
        };

        let placeholders = self
            .placeholders
            .unwrap_or_else(|| PlaceholderRenderer::new(&self.config.placeholder));

        tracing::debug!(
            provider = provider.name(),
            url = %imagegen.url,
            execution = ?imagegen.execution,
            bitmap_fonts = placeholders.uses_bitmap_fonts(),
            "image generation server initialized"
        );

        Ok(Server {
            provider,
            placeholders: Arc::new(placeholders),
            upload: self.config.upload.clone(),
            execution: imagegen.execution,
            metrics: GenerationMetrics::new(),
            reencode: self.reencode,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        io::Cursor,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::{placeholder::background_for, upload::ValidatedUpload};

    /// Canned reply for prompts containing a given style
    enum Reply {
        Image,
        Status(u16),
        Garbage,
        Timeout,
    }

    struct FakeProvider {
        replies: HashMap<&'static str, Reply>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(replies: impl IntoIterator<Item = (&'static str, Reply)>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    fn png(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[async_trait]
    impl ImageGenProvider for Arc<FakeProvider> {
        async fn generate(&self, request: VariantRequest<'_>) -> std::result::Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.to_string());

            let reply = self
                .replies
                .iter()
                .find(|(style, _)| request.prompt.contains(*style))
                .map(|(_, reply)| reply);

            match reply {
                Some(Reply::Image) | None => Ok(png(512, 512, [1, 2, 3])),
                Some(Reply::Status(status)) => Err(ProviderError::Status {
                    status: *status,
                    body: "model loading".to_string(),
                }),
                Some(Reply::Garbage) => Ok(b"<html>not an image</html>".to_vec()),
                Some(Reply::Timeout) => Err(ProviderError::Timeout),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn server(provider: &Arc<FakeProvider>, execution: &str) -> Server {
        let config = remix_config::Config::from_toml(&format!("[imagegen]\nexecution = \"{execution}\"")).unwrap();

        ImageGenServerBuilder::new(&config)
            .with_provider(Box::new(Arc::clone(provider)))
            .with_placeholders(PlaceholderRenderer::bitmap())
            .build()
            .unwrap()
    }

    fn upload(bytes: Vec<u8>) -> ValidatedUpload {
        ValidatedUpload {
            filename: "cat.png".to_string(),
            bytes,
            description: "a cat".to_string(),
        }
    }

    fn decode(payload: &str) -> RgbImage {
        image::load_from_memory(&BASE64.decode(payload).unwrap()).unwrap().into_rgb8()
    }

    #[tokio::test]
    async fn all_variants_generated() {
        let provider = Arc::new(FakeProvider::new([]));
        let response = server(&provider, "sequential").generate(upload(png(100, 100, [9, 9, 9]))).await.unwrap();

        assert!(response.success);
        assert_eq!(response.images.len(), 4);
        assert_eq!(response.message, "Generated 4 variations successfully");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

        for image in &response.images {
            let decoded = decode(image);
            assert_eq!(decoded.dimensions(), (512, 512));
            assert_eq!(decoded.get_pixel(0, 0), &Rgb([1, 2, 3]));
        }
    }

    #[tokio::test]
    async fn sequential_calls_follow_prompt_order() {
        let provider = Arc::new(FakeProvider::new([]));
        server(&provider, "sequential").generate(upload(png(10, 10, [0, 0, 0]))).await.unwrap();

        let prompts = provider.prompts.lock().unwrap().clone();
        let expected: Vec<_> = prompts::expand("a cat").into_iter().map(|v| v.prompt).collect();
        assert_eq!(prompts, expected);
    }

    #[tokio::test]
    async fn failures_are_masked_by_placeholders() {
        let provider = Arc::new(FakeProvider::new([
            ("meme style", Reply::Status(503)),
            ("comic book", Reply::Garbage),
            ("digital art", Reply::Timeout),
        ]));
        let server = server(&provider, "sequential");
        let variants = prompts::expand("a cat");

        let generated = server.generate_variants(&variants, "").await.unwrap();
        let outcomes: Vec<_> = generated.iter().map(|v| v.outcome).collect();

        assert_eq!(
            outcomes,
            [
                VariantOutcome::Generated,
                VariantOutcome::Placeholder,
                VariantOutcome::Placeholder,
                VariantOutcome::Placeholder,
            ]
        );

        // Status failures and transport failures are labelled differently
        assert_eq!(decode(&generated[1].image).get_pixel(0, 0), &background_for("Variation 2"));
        assert_eq!(decode(&generated[2].image).get_pixel(0, 0), &background_for("Error - Variation 3"));
        assert_eq!(decode(&generated[3].image).get_pixel(0, 0), &background_for("Error - Variation 4"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn panicking_decoder_only_replaces_its_variant() {
        fn reencode(bytes: &[u8]) -> ImageResult<String> {
            assert!(!bytes.starts_with(b"<html>"), "decoder blew up");
            reencode_png_base64(bytes)
        }

        let provider = Arc::new(FakeProvider::new([("meme style", Reply::Garbage)]));
        let config = remix_config::Config::from_toml("").unwrap();
        let server = ImageGenServerBuilder::new(&config)
            .with_provider(Box::new(Arc::clone(&provider)))
            .with_placeholders(PlaceholderRenderer::bitmap())
            .with_reencoder(reencode)
            .build()
            .unwrap();

        let response = server.generate(upload(png(32, 32, [7, 7, 7]))).await.unwrap();

        assert_eq!(response.images.len(), 4);
        let corners: Vec<_> = response.images.iter().map(|image| *decode(image).get_pixel(0, 0)).collect();
        assert_eq!(corners[0], Rgb([1, 2, 3]));
        assert_eq!(corners[1], background_for("Error - Variation 2"));
        assert_eq!(corners[2], Rgb([1, 2, 3]));
        assert_eq!(corners[3], Rgb([1, 2, 3]));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn every_variant_failing_still_returns_four_images() {
        let provider = Arc::new(FakeProvider::new([("a cat", Reply::Status(500))]));
        let response = server(&provider, "sequential").generate(upload(png(64, 64, [5, 5, 5]))).await.unwrap();

        assert!(response.success);
        assert_eq!(response.images.len(), 4);
        assert!(response.images.iter().all(|image| decode(image).dimensions() == (512, 512)));
    }

    #[tokio::test]
    async fn concurrent_mode_keeps_order() {
        let provider = Arc::new(FakeProvider::new([("cartoon", Reply::Status(429))]));
        let server = server(&provider, "concurrent");
        let variants = prompts::expand("a dog");

        let generated = server.generate_variants(&variants, "").await.unwrap();

        assert_eq!(generated.len(), 4);
        assert_eq!(generated[0].outcome, VariantOutcome::Placeholder);
        assert_eq!(decode(&generated[0].image).get_pixel(0, 0), &background_for("Variation 1"));
        assert!(generated[1..].iter().all(|v| v.outcome == VariantOutcome::Generated));
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_processing_error() {
        let provider = Arc::new(FakeProvider::new([]));
        let err = server(&provider, "sequential").generate(upload(Vec::new())).await.unwrap_err();

        assert!(matches!(err, ImageGenError::ImageProcessing(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_images_never_call_provider() {
        let provider = Arc::new(FakeProvider::new([]));
        let response = server(&provider, "sequential").test_images().await.unwrap();

        assert_eq!(response.images.len(), 4);
        assert_eq!(response.message, "Test generation succeeded");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(decode(&response.images[2]).get_pixel(0, 0), &background_for("Test 3"));
    }
}
