mod common;

use std::sync::Arc;

use common::*;
use nsone_exporter::api::ApiServer;
use nsone_exporter::config::ExportSettings;
use poem::http::StatusCode;
use poem::test::TestClient;

fn server(api: FakeApi) -> ApiServer {
    let settings = ExportSettings {
        qps_of_zones: filter(".*"),
        ..Default::default()
    };
    ApiServer::new(
        Arc::new(orchestrator(Arc::new(api), settings)),
        "127.0.0.1:0".to_string(),
        "/metrics".to_string(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_exposes_collected_snapshot() {
    let server = server(FakeApi::with_zones(vec![zone("example.com", Vec::new())]));
    let client = TestClient::new(server.routes());

    let resp = client.get("/metrics").send().await;

    resp.assert_status_is_ok();
    resp.assert_content_type("text/plain; version=0.0.4");
    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.contains("nsone_up 1"), "{body}");
    assert!(body.contains("nsone_qps_zones{zone=\"example.com\"} 5"), "{body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_cycle_still_exposes_health_gauge() {
    let server = server(FakeApi::with_zones(Vec::new()).failing("zones"));
    let client = TestClient::new(server.routes());

    let resp = client.get("/metrics").send().await;

    resp.assert_status_is_ok();
    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.contains("nsone_up 0"), "{body}");
    assert!(!body.contains("nsone_qps_zones{"), "{body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn landing_page_links_to_metrics() {
    let server = server(FakeApi::default());
    let client = TestClient::new(server.routes());

    let resp = client.get("/").send().await;

    resp.assert_status_is_ok();
    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.contains("<a href='/metrics'>Metrics</a>"), "{body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_path_is_not_found() {
    let client = TestClient::new(server(FakeApi::default()).routes());

    client.get("/nope").send().await.assert_status(StatusCode::NOT_FOUND);
}
