use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use remix_config::GenerationParameters;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{ImageGenProvider, ProviderError, VariantRequest};

/// Hugging Face serverless inference provider
///
/// The endpoint answers a successful text-to-image call with the raw image
/// bytes as the response body.
pub(crate) struct HuggingFaceProvider {
    client: Client,
    url: Url,
    api_key: Option<SecretString>,
    parameters: GenerationParameters,
    send_reference_image: bool,
}

impl HuggingFaceProvider {
    pub fn new(
        client: Client,
        url: Url,
        api_key: Option<SecretString>,
        parameters: GenerationParameters,
        send_reference_image: bool,
    ) -> Self {
        // An empty token means anonymous access
        let api_key = api_key.filter(|key| !key.expose_secret().is_empty());

        Self {
            client,
            url,
            api_key,
            parameters,
            send_reference_image,
        }
    }
}

/// Wire format for the inference request
#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Serialize)]
struct InferenceParameters {
    num_inference_steps: u32,
    guidance_scale: f32,
    width: u32,
    height: u32,
}

impl From<&GenerationParameters> for InferenceParameters {
    fn from(parameters: &GenerationParameters) -> Self {
        Self {
            num_inference_steps: parameters.num_inference_steps,
            guidance_scale: parameters.guidance_scale,
            width: parameters.width,
            height: parameters.height,
        }
    }
}

#[async_trait]
impl ImageGenProvider for HuggingFaceProvider {
    async fn generate(&self, request: VariantRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        let wire_request = InferenceRequest {
            inputs: request.prompt,
            parameters: InferenceParameters::from(&self.parameters),
            image: request.reference_image.filter(|_| self.send_reference_image),
        };

        let mut builder = self.client.post(self.url.clone()).json(&wire_request);

        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        tracing::debug!(provider = self.name(), url = %self.url, "sending inference request");

        let response = builder.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;

        tracing::debug!(provider = self.name(), bytes = bytes.len(), "inference request complete");

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
