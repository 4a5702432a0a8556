#![allow(clippy::unwrap_used)]
// End-to-end reconciliation against a wiremock dashboard: CSV in,
// minimal PUT bodies out.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashsync_core::{
    Batch, DashboardClient, Endpoint, OutcomeStatus, QueueMessage, Reconciler, RetryPolicy,
    Serial, normalize_rows, parse_csv,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DashboardClient) {
    let server = MockServer::start().await;
    let base = format!("{}/api/v1", server.uri());
    let client = DashboardClient::from_reqwest(&base, reqwest::Client::new()).unwrap();
    (server, client)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        padding: Duration::ZERO,
    }
}

fn serial(s: &str) -> Serial {
    s.parse().unwrap()
}

async fn mount_device(server: &MockServer, serial: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/devices/{serial}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_csv_row_reconciles_both_endpoints() {
    let (server, client) = setup().await;

    mount_device(
        &server,
        "ABCD-1234-WXYZ",
        json!({ "serial": "ABCD-1234-WXYZ", "name": "old", "tags": ["a", "b"] }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/ABCD-1234-WXYZ/managementInterface"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "wan1": { "wanEnabled": "not configured", "usingStaticIp": false }
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/ABCD-1234-WXYZ"))
        .and(body_json(json!({ "serial": "ABCD-1234-WXYZ", "name": "Lobby" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/ABCD-1234-WXYZ/managementInterface"))
        .and(body_json(json!({
            "wan1": { "wanEnabled": "enabled", "vlan": 100 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let rows = parse_csv(
        "deviceSerial,deviceName,deviceTags,w1Enabled,w1Vlan\n\
         abcd-1234-wxyz,Lobby,\"a, b\",yes,100\n",
    )
    .unwrap();
    let configs = normalize_rows(&rows);

    // Round-trip through the queue codec like enqueue/reconcile do.
    let messages: Vec<QueueMessage> = configs
        .iter()
        .flat_map(|c| QueueMessage::from_config(c).unwrap())
        .collect();
    let batch = Batch::from_messages(&messages);

    let report = Reconciler::new(&client).run(&batch).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.updated(), 2);
    assert_eq!(
        report.outcome(&serial("ABCD-1234-WXYZ"), Endpoint::Device),
        Some(&OutcomeStatus::Updated {
            fields: vec!["name".into()]
        })
    );
}

#[tokio::test]
async fn test_failing_fetch_isolated_to_one_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    for s in ["BBBB-BBBB-BBBB", "CCCC-CCCC-CCCC"] {
        mount_device(&server, s, json!({ "serial": s, "name": "old" })).await;
        Mock::given(method("PUT"))
            .and(path(format!("/api/v1/devices/{s}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let rows = parse_csv(
        "deviceSerial,deviceName\n\
         AAAA-AAAA-AAAA,a\n\
         BBBB-BBBB-BBBB,b\n\
         CCCC-CCCC-CCCC,c\n",
    )
    .unwrap();
    let batch = Batch::from_configs(normalize_rows(&rows));

    let report = Reconciler::new(&client).run(&batch).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.updated(), 2);
    match report.outcome(&serial("AAAA-AAAA-AAAA"), Endpoint::Device) {
        Some(OutcomeStatus::Failed { reason }) => assert!(reason.contains("boom"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_fetch_is_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_device(&server, "AAAA-AAAA-AAAA", json!({ "name": "old" })).await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut batch = Batch::new();
    let mut identity = dashsync_core::DeviceIdentity::new(serial("AAAA-AAAA-AAAA"));
    identity.name = Some("new".into());
    batch.push_identity(identity);

    let report = Reconciler::new(&client)
        .with_retry(fast_retry())
        .run(&batch)
        .await;

    assert_eq!(report.updated(), 1, "{report:?}");
}

#[tokio::test]
async fn test_invalid_api_key_is_reported_per_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut batch = Batch::new();
    let mut identity = dashsync_core::DeviceIdentity::new(serial("AAAA-AAAA-AAAA"));
    identity.notes = Some("n".into());
    batch.push_identity(identity);

    let report = Reconciler::new(&client).run(&batch).await;

    match report.outcome(&serial("AAAA-AAAA-AAAA"), Endpoint::Device) {
        Some(OutcomeStatus::Failed { reason }) => {
            assert!(reason.contains("Invalid API key"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_small_wan_change_is_not_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA/managementInterface"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "wan1": { "wanEnabled": "enabled", "usingStaticIp": false, "vlan": 10 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let rows = parse_csv("deviceSerial,w1Enabled,w1Vlan\nAAAA-AAAA-AAAA,yes,20\n").unwrap();
    let batch = Batch::from_configs(normalize_rows(&rows));

    let report = Reconciler::new(&client).run(&batch).await;

    assert_eq!(
        report.outcome(&serial("AAAA-AAAA-AAAA"), Endpoint::ManagementInterface),
        Some(&OutcomeStatus::Unchanged)
    );
}

#[tokio::test]
async fn test_rate_limited_update_is_retried() {
    let (server, client) = setup().await;

    mount_device(&server, "AAAA-AAAA-AAAA", json!({ "name": "old" })).await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA"))
        .and(body_json(json!({ "serial": "AAAA-AAAA-AAAA", "name": "new" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut batch = Batch::new();
    let mut identity = dashsync_core::DeviceIdentity::new(serial("AAAA-AAAA-AAAA"));
    identity.name = Some("new".into());
    batch.push_identity(identity);

    let report = Reconciler::new(&client)
        .with_retry(fast_retry())
        .run(&batch)
        .await;

    assert_eq!(report.updated(), 1, "{report:?}");
}

#[tokio::test]
async fn test_vlan_only_row_leaves_live_uplink_alone() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/AAAA-AAAA-AAAA/managementInterface"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "wan1": {
                "wanEnabled": "enabled",
                "usingStaticIp": true,
                "staticIp": "1.2.3.4",
                "vlan": 10
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let rows = parse_csv("deviceSerial,w1Vlan\nAAAA-AAAA-AAAA,20\n").unwrap();
    let batch = Batch::from_configs(normalize_rows(&rows));

    let report = Reconciler::new(&client).run(&batch).await;

    assert_eq!(
        report.outcome(&serial("AAAA-AAAA-AAAA"), Endpoint::ManagementInterface),
        Some(&OutcomeStatus::Unchanged)
    );
}
