use http::Method;
use http::header::HeaderName;
use remix_config::{AnyOrArray, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = match &config.origins {
        AnyOrArray::Any => AllowOrigin::any(),
        AnyOrArray::List(origins) => {
            AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
        }
    };

    let methods = match &config.methods {
        AnyOrArray::Any => AllowMethods::any(),
        AnyOrArray::List(methods) => {
            AllowMethods::list(methods.iter().filter_map(|m| m.parse::<Method>().ok()))
        }
    };

    let headers = match &config.headers {
        AnyOrArray::Any => AllowHeaders::any(),
        AnyOrArray::List(headers) => {
            AllowHeaders::list(headers.iter().filter_map(|h| h.parse::<HeaderName>().ok()))
        }
    };

    let layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers);

    match config.max_age_duration() {
        Some(duration) => layer.max_age(duration),
        None => layer,
    }
}
