use marknote_sync::{ApiTransport, Method, SyncError, Transport};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> ApiTransport {
    ApiTransport::new(server.uri(), "test_key")
}

// ── Routing: everything goes to the one endpoint ────────────────

#[tokio::test]
async fn logical_path_travels_as_query_parameter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("api_path", "api/v1/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"notes": []})))
        .expect(1)
        .mount(&server)
        .await;

    // The leading slash must be stripped before it hits the wire.
    let value = transport(&server)
        .request_json(Method::Get, "/api/v1/notes", None, &[])
        .await
        .unwrap();
    assert_eq!(value["notes"], json!([]));
}

#[tokio::test]
async fn every_request_carries_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn extra_query_params_are_merged() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("api_path", "api/v1/search"))
        .and(query_param("keyword", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .request_json(Method::Get, "api/v1/search", None, &[("keyword", "rust")])
        .await
        .unwrap();
}

#[tokio::test]
async fn post_body_is_sent_as_json() {
    let server = MockServer::start().await;
    let body = json!({"path": "a.md", "content": "# hi"});

    Mock::given(method("POST"))
        .and(query_param("api_path", "api/v1/notes"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .request_json(Method::Post, "api/v1/notes", Some(body.clone()), &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_method_is_supported() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(query_param("api_path", "api/v1/notes/a.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .request_json(Method::Delete, "api/v1/notes/a.md", None, &[])
        .await
        .unwrap();
}

// ── Error taxonomy ──────────────────────────────────────────────

#[tokio::test]
async fn non_200_maps_to_server_error_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = transport(&server)
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Server { status: 403 }));
}

#[tokio::test]
async fn non_200_body_is_never_parsed_as_success() {
    let server = MockServer::start().await;

    // A plausible success payload behind a 500 must still be an error.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let err = transport(&server)
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Server { status: 500 }));
}

#[tokio::test]
async fn malformed_body_maps_to_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Protocol(_)));
}

#[tokio::test]
async fn connection_refused_maps_to_connection_error() {
    // Port 1 is never listening.
    let transport = ApiTransport::new("http://127.0.0.1:1", "k");

    let err = transport
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = ApiTransport::with_timeout(server.uri(), "k", Duration::from_millis(200));
    let err = transport
        .request_json(Method::Get, "api/v1/notes", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Timeout), "got {err:?}");
}

// ── test_connection ─────────────────────────────────────────────

#[tokio::test]
async fn test_connection_sends_diagnostic_flag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("test_connection", "1"))
        .and(header("Authorization", "Bearer test_key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server).test_connection().await.unwrap();
}

#[tokio::test]
async fn test_connection_rejects_non_200() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = transport(&server).test_connection().await.unwrap_err();
    assert!(matches!(err, SyncError::Server { status: 403 }));
}
