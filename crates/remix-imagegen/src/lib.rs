#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod http_client;
mod normalize;
mod placeholder;
mod prompts;
mod provider;
mod server;
mod types;
mod upload;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};

pub use error::{ImageGenError, Result};
pub use placeholder::{PlaceholderRenderer, background_for};
pub use prompts::VARIANT_COUNT;
pub use server::{ImageGenServerBuilder, Server};
pub use types::{ErrorResponse, GenerateResponse};

use upload::ExtractUpload;

/// Build the image generation server from configuration
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &remix_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for image generation
///
/// Routes are registered under the configured mount path.
pub fn endpoint_router(config: &remix_config::Config) -> Router<Arc<Server>> {
    Router::new()
        .route(
            &config.server.route("/generate"),
            post(generate).layer(DefaultBodyLimit::max(config.upload.max_body_bytes)),
        )
        .route(&config.server.route("/test"), get(test_generation))
}

/// Handle generation requests
async fn generate(
    State(server): State<Arc<Server>>,
    ExtractUpload(form): ExtractUpload,
) -> Result<Json<GenerateResponse>> {
    let upload = form.validate(server.upload_limits())?;

    tracing::debug!("Generation handler called for {}", upload.filename);

    let response = server.generate(upload).await?;

    Ok(Json(response))
}

/// Handle test generation requests
async fn test_generation(State(server): State<Arc<Server>>) -> Result<Json<GenerateResponse>> {
    tracing::debug!("Test generation handler called");

    Ok(Json(server.test_images().await?))
}
