use std::time::Duration;

use axum::http;
use reqwest::Client;

/// Build the outbound client for an inference provider
///
/// `timeout` bounds each whole request, so a stalled upstream turns into a
/// placeholder instead of holding the caller indefinitely.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
        .build()
}
