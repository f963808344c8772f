mod harness;

use harness::config::ConfigBuilder;
use harness::mock_inference::MockInference;
use harness::server::TestServer;

#[tokio::test]
async fn health_endpoint_reports_online() {
    let mock = MockInference::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.url()).build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/api/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "online");
    assert_eq!(body["message"], "Server is running");
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let mock = MockInference::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.url()).without_health().build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/api/health")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn routes_outside_mount_path_are_not_found() {
    let mock = MockInference::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.url()).build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}
