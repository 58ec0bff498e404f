//! Integration tests for the OMS workspace endpoints using wiremock.
//!
//! The mock server stands in for the management API. Requests are matched
//! on method, exact path, `api-version` query and Authorization header so
//! that URL construction is verified end to end.
//!
//! - GET  .../workspaces              — list all
//! - GET  .../workspaces/{name}       — get one
//! - POST .../workspaces/{name}/search — search

use azure_oms::auth::AuthorizationHeader;
use azure_oms::client::RestClient;
use azure_oms::error::OmsError;
use azure_oms::workspace::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION: &str = "/subscriptions/S/resourcegroups/OI-Default-East-US/providers/Microsoft.OperationalInsights/workspaces";

fn token() -> AuthorizationHeader {
    AuthorizationHeader::new("Bearer mock-token")
}

/// Helper: creates a RestClient pointed at the given wiremock server.
fn mock_client(server: &MockServer) -> RestClient {
    RestClient::with_base_url(&server.uri()).unwrap()
}

// ── list_or_get_workspace ──────────────────────────────────────────────

#[tokio::test]
async fn list_workspaces_unwraps_value_collection() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(COLLECTION))
        .and(query_param("api-version", "2014-10-10"))
        .and(header("authorization", "Bearer mock-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "name": "contoso",
                    "location": "East US",
                    "properties": {"provisioningState": "Succeeded"}
                },
                {"name": "fabrikam", "location": "East US"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let workspaces: Vec<Workspace> =
        list_or_get_workspace(&client, &token(), "S", "East-US", None, "2014-10-10")
            .await
            .unwrap();

    assert_eq!(workspaces.len(), 2);
    assert_eq!(workspaces[0].name, "contoso");
    assert_eq!(
        workspaces[0]
            .properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref()),
        Some("Succeeded")
    );
    assert_eq!(workspaces[1].name, "fabrikam");
}

#[tokio::test]
async fn empty_workspace_name_lists_all() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(COLLECTION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "a"}]})))
        .expect(2)
        .mount(&server)
        .await;

    let from_empty: Vec<Value> =
        list_or_get_workspace(&client, &token(), "S", "East-US", Some(""), "2014-10-10")
            .await
            .unwrap();
    let from_absent: Vec<Value> =
        list_or_get_workspace(&client, &token(), "S", "East-US", None, "2014-10-10")
            .await
            .unwrap();

    assert_eq!(from_empty, from_absent);
}

#[tokio::test]
async fn get_named_workspace_returns_single_element() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(format!("{COLLECTION}/contoso")))
        .and(query_param("api-version", "2014-10-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": format!("{COLLECTION}/contoso"),
            "name": "contoso",
            "properties": {"customerId": "cust-001"}
        })))
        .mount(&server)
        .await;

    let workspaces: Vec<Workspace> = list_or_get_workspace(
        &client,
        &token(),
        "S",
        "East-US",
        Some("contoso"),
        "2014-10-10",
    )
    .await
    .unwrap();

    assert_eq!(workspaces.len(), 1, "get-one is a single-element sequence");
    assert_eq!(workspaces[0].name, "contoso");
    assert_eq!(
        workspaces[0]
            .properties
            .as_ref()
            .and_then(|p| p.customer_id.as_deref()),
        Some("cust-001")
    );
}

#[tokio::test]
async fn repeated_list_calls_are_identical() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(COLLECTION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "contoso"}, {"name": "fabrikam"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let first: Vec<Value> =
        list_or_get_workspace(&client, &token(), "S", "East-US", None, "2014-10-10")
            .await
            .unwrap();
    let second: Vec<Value> =
        list_or_get_workspace(&client, &token(), "S", "East-US", None, "2014-10-10")
            .await
            .unwrap();

    assert_eq!(first, second, "no state accumulates between calls");
}

#[tokio::test]
async fn unknown_workspace_returns_api_error_with_body() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(format!("{COLLECTION}/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "ResourceNotFound",
                "message": "The Resource 'Microsoft.OperationalInsights/workspaces/missing' was not found."
            }
        })))
        .mount(&server)
        .await;

    let err = list_or_get_workspace::<Value>(
        &client,
        &token(),
        "S",
        "East-US",
        Some("missing"),
        "2014-10-10",
    )
    .await
    .unwrap_err();

    match err {
        OmsError::Api { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("ResourceNotFound"), "body must be intact: {body}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── search_workspace ───────────────────────────────────────────────────

#[tokio::test]
async fn search_posts_query_and_unwraps_value() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(format!("{COLLECTION}/ops/search")))
        .and(query_param("api-version", "2014-10-10"))
        .and(header("authorization", "Bearer mock-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"Query": "Type:Alert"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"a": 1}]})))
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<Value> = search_workspace(
        &client,
        &token(),
        "S",
        "ops",
        "East-US",
        "2014-10-10",
        "Type:Alert",
    )
    .await
    .unwrap();

    assert_eq!(results, vec![json!({"a": 1})]);
}

#[tokio::test]
async fn search_without_value_returns_original_object() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(format!("{COLLECTION}/ops/search")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
        .mount(&server)
        .await;

    let results: Vec<Value> = search_workspace(
        &client,
        &token(),
        "S",
        "ops",
        "East-US",
        "2014-10-10",
        "Type:Alert",
    )
    .await
    .unwrap();

    assert_eq!(results, vec![json!({"a": 1})]);
}

#[tokio::test]
async fn search_query_with_quotes_is_sent_as_valid_json() {
    let server = MockServer::start().await;
    let client = mock_client(&server);
    let query = r#"Type:Event Computer="web\01""#;

    Mock::given(method("POST"))
        .and(path(format!("{COLLECTION}/ops/search")))
        .and(body_json(json!({"Query": query})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<Value> =
        search_workspace(&client, &token(), "S", "ops", "East-US", "2014-10-10", query)
            .await
            .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_bad_request_propagates_status() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(format!("{COLLECTION}/ops/search")))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid query syntax"))
        .mount(&server)
        .await;

    let err = search_workspace::<Value>(
        &client,
        &token(),
        "S",
        "ops",
        "East-US",
        "2014-10-10",
        "Type:(",
    )
    .await
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("400"), "got: {msg}");
    assert!(msg.contains("Invalid query syntax"), "got: {msg}");
}
