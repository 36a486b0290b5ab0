//! End-to-end tests of the blocking client against a mock provider.
//!
//! The blocking reqwest client owns an internal runtime and must be created,
//! used and dropped outside of the test's async context, hence
//! `spawn_blocking`.

use std::time::Duration;

use api_types::RecordType;
use api_types::StatsPeriod;
use nsone_client::ClientConfig;
use nsone_client::ClientError;
use nsone_client::Lookup;
use nsone_client::NsoneClient;
use nsone_client::RetryPolicy;
use nsone_client::StatsApi;
use serde_json::json;
use similar_asserts::assert_eq;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new("test-key")
        .with_api_url(format!("{}/v1", server.uri()))
        .with_request_timeout(Duration::from_millis(500))
        .with_max_connections(2)
        .with_retry_policy(RetryPolicy {
            max_attempts: 5,
            timeout_backoff: Duration::from_millis(10),
            rate_limit_backoff: Duration::from_millis(20),
        })
}

async fn with_client<F, R>(server: &MockServer, f: F) -> R
where
    F: FnOnce(&NsoneClient) -> R + Send + 'static,
    R: Send + 'static,
{
    let config = config(server);
    tokio::task::spawn_blocking(move || {
        let client = NsoneClient::new(&config).expect("create client");
        f(&client)
    })
    .await
    .expect("join")
}

#[tokio::test]
async fn sends_api_key_and_decodes_zone_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/zones"))
        .and(header("X-NSONE-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"zone": "example.com", "link": null},
            {"zone": "alias.example", "link": "example.com"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let zones = with_client(&server, |client| client.zones())
        .await
        .expect("zones");

    let names: Vec<_> = zones.iter().map(|zone| zone.name.as_str()).collect();
    assert_eq!(names, vec!["example.com", "alias.example"]);
    assert!(zones[1].is_linked());
}

#[tokio::test]
async fn null_fields_in_zone_listing_do_not_fail_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"zone": "example.com", "pool": null, "hostmaster": null, "serial": null, "ttl": null},
            {"zone": "example.org", "id": null, "records": null, "dns_servers": null}
        ])))
        .mount(&server)
        .await;

    let zones = with_client(&server, |client| client.zones())
        .await
        .expect("zones");

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].serial, 0);
    assert_eq!(zones[1].name, "example.org");
}

#[tokio::test]
async fn rate_limited_requests_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/qps/example.com"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/qps/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"qps": 4.25})))
        .mount(&server)
        .await;

    let qps = with_client(&server, |client| client.zone_qps("example.com"))
        .await
        .expect("qps");

    assert_eq!(qps, 4.25);
    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn slow_responses_are_retried_as_timeouts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/qps"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"qps": 1.0}))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/qps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"qps": 9.0})))
        .mount(&server)
        .await;

    let qps = with_client(&server, |client| client.account_qps())
        .await
        .expect("qps");

    assert_eq!(qps, 9.0);
}

#[tokio::test]
async fn missing_zone_is_not_found_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/zones/gone.example"))
        .respond_with(ResponseTemplate::new(404).set_body_string("zone not found"))
        .expect(1)
        .mount(&server)
        .await;

    let zone = with_client(&server, |client| client.zone("gone.example"))
        .await
        .expect("lookup");

    assert_eq!(zone, Lookup::NotFound);
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/qps/example.com/www.example.com/A"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let report = with_client(&server, |client| {
        client.record_qps("example.com", "www.example.com", RecordType::A)
    })
    .await
    .unwrap_err();

    assert!(matches!(
        report.current_context(),
        ClientError::Status { status: 503 }
    ));
    assert!(format!("{report:?}").contains("maintenance"));
}

#[tokio::test]
async fn account_usage_requires_exactly_one_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/usage"))
        .and(query_param("period", "1h"))
        .and(query_param("expand", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"queries": 100.0}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/usage"))
        .and(query_param("period", "30d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"queries": 1.0},
            {"queries": 2.0}
        ])))
        .mount(&server)
        .await;

    let (hourly, monthly) = with_client(&server, |client| {
        (
            client.account_usage(StatsPeriod::Hourly),
            client.account_usage(StatsPeriod::Monthly),
        )
    })
    .await;

    assert_eq!(hourly.expect("hourly usage").queries, 100.0);
    let report = monthly.unwrap_err();
    assert!(matches!(
        report.current_context(),
        ClientError::UnexpectedPayload { .. }
    ));
}

#[tokio::test]
async fn records_usage_is_expanded_per_zone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/stats/usage/example.com"))
        .and(query_param("period", "24h"))
        .and(query_param("expand", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"zone": "example.com", "domain": "www.example.com", "rectype": "A", "queries": 10},
            {"zone": "example.com", "domain": "example.com", "rectype": "MX", "queries": 3}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let usages = with_client(&server, |client| {
        client.records_usage("example.com", StatsPeriod::Daily)
    })
    .await
    .expect("usages");

    let subjects: Vec<_> = usages.iter().map(|usage| usage.filter_subject()).collect();
    assert_eq!(subjects, vec!["A www.example.com", "MX example.com"]);
}
