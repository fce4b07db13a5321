use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

/// Send one request through a fresh clone of the shared router.
async fn send(app: &axum::Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- list ---

#[tokio::test]
async fn list_unknown_entity_is_empty() {
    let resp = app().oneshot(empty_request("GET", "/items")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"items": []}));
}

#[tokio::test]
async fn list_rejects_malformed_filter() {
    let resp = app()
        .oneshot(empty_request("GET", "/items?q=CODE%20eq"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["Message"].as_str().unwrap().contains("invalid filter"));
}

#[tokio::test]
async fn list_filters_pages_and_counts() {
    let app = app();
    for code in ["KB-1", "KB-2", "MS-1"] {
        let resp = send(&app, json_request("POST", "/items", &json!({"CODE": code}).to_string())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = send(
        &app,
        empty_request("GET", "/items?q=CODE%20like%20%27KB%2A%27&limit=1&withCount=true"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["CODE"], "KB-1");

    let resp = send(&app, empty_request("GET", "/items?offset=2&fields=CODE")).await;
    let page = body_json(resp).await;
    assert_eq!(page["items"], json!([{"CODE": "MS-1", "INTERNAL_REFERENCE": 3}]));
}

#[tokio::test]
async fn read_with_body_uses_json_options() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A"}"#)).await;
    send(&app, json_request("POST", "/items", r#"{"CODE":"B"}"#)).await;

    let resp = send(
        &app,
        json_request("POST", "/items/readwithbodyparamters", r#"{"q":"CODE eq 'B'"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["items"][0]["CODE"], "B");
}

// --- create ---

#[tokio::test]
async fn create_assigns_sequential_references() {
    let app = app();
    let first = body_json(send(&app, json_request("POST", "/items", r#"{"CODE":"A"}"#)).await).await;
    let second = body_json(send(&app, json_request("POST", "/items", r#"{"CODE":"B"}"#)).await).await;
    assert_eq!(first["INTERNAL_REFERENCE"], 1);
    assert_eq!(second["INTERNAL_REFERENCE"], 2);
}

#[tokio::test]
async fn create_rejects_non_object_body() {
    let resp = app()
        .oneshot(json_request("POST", "/items", "[1,2]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- single records ---

#[tokio::test]
async fn get_missing_record_is_404() {
    let resp = app().oneshot(empty_request("GET", "/items/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_bad_id_is_400() {
    let resp = app()
        .oneshot(json_request("PUT", "/items/abc", r#"{"CODE":"X"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_replaces_and_patch_merges() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A","NAME":"Apple"}"#)).await;

    let resp = send(&app, json_request("PATCH", "/items/1", r#"{"NAME":"Apricot","INTERNAL_REFERENCE":50}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"CODE": "A", "NAME": "Apricot", "INTERNAL_REFERENCE": 1})
    );

    let resp = send(&app, json_request("PUT", "/items/1", r#"{"CODE":"B"}"#)).await;
    assert_eq!(body_json(resp).await, json!({"CODE": "B", "INTERNAL_REFERENCE": 1}));
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A"}"#)).await;

    let resp = send(&app, empty_request("DELETE", "/items/1")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, empty_request("GET", "/items/1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&app, empty_request("DELETE", "/items/1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- ancillary ---

#[tokio::test]
async fn tracking_round_trip() {
    let app = app();
    let resp = send(&app, empty_request("GET", "/items/checktrack")).await;
    assert_eq!(body_json(resp).await, json!({"Tracked": false}));

    let resp = send(&app, empty_request("POST", "/items/track")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, empty_request("GET", "/items/checktrack")).await;
    assert_eq!(body_json(resp).await, json!({"Tracked": true}));

    send(&app, empty_request("POST", "/items/untrack")).await;
    let resp = send(&app, empty_request("GET", "/items/checktrack")).await;
    assert_eq!(body_json(resp).await, json!({"Tracked": false}));
}

#[tokio::test]
async fn db_columns_reflect_stored_fields() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A","PRICE":1.5}"#)).await;
    let resp = send(&app, empty_request("GET", "/items/dbcolumns")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!([
            {"Name": "CODE", "Type": "string", "Nullable": true},
            {"Name": "INTERNAL_REFERENCE", "Type": "int", "Nullable": false},
            {"Name": "PRICE", "Type": "float", "Nullable": true},
        ])
    );
}

// --- actions ---

#[tokio::test]
async fn export_to_xml_returns_parameter() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A"}"#)).await;
    let resp = send(&app, empty_request("GET", "/items/1/ExportToXML")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!([{"Key": "XML", "Value": "<items><CODE>A</CODE><INTERNAL_REFERENCE>1</INTERNAL_REFERENCE></items>"}])
    );
}

#[tokio::test]
async fn apply_campaign_stamps_code() {
    let app = app();
    send(&app, json_request("POST", "/salesOrders", r#"{"NUMBER":"SO-1"}"#)).await;
    let resp = send(&app, empty_request("POST", "/salesOrders/1/ApplyCampaign/SUMMER")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order = body_json(resp).await;
    assert_eq!(order["CAMPAIGN_CODE"], "SUMMER");

    let resp = send(&app, empty_request("POST", "/salesOrders/7/ApplyCampaign")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn record_actions_under_non_numeric_ids_are_404() {
    let app = app();
    send(&app, json_request("POST", "/items", r#"{"CODE":"A"}"#)).await;
    let resp = send(&app, empty_request("GET", "/items/ABC/ExportToXML")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, empty_request("POST", "/salesOrders/SO-1/ApplyCampaign/SUMMER")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_actions_echo_their_call() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/items/3/Recalculate/a/b", r#"{"FORCE":true}"#),
    )
    .await;
    assert_eq!(
        body_json(resp).await,
        json!([
            {"Key": "Action", "Value": "Recalculate"},
            {"Key": "Id", "Value": 3},
            {"Key": "Params", "Value": ["a", "b"]},
            {"Key": "Body", "Value": {"FORCE": true}},
        ])
    );

    let resp = send(&app, empty_request("GET", "/items/GetDefaults/2")).await;
    assert_eq!(
        body_json(resp).await,
        json!([
            {"Key": "Action", "Value": "GetDefaults"},
            {"Key": "Id", "Value": null},
            {"Key": "Params", "Value": ["2"]},
        ])
    );
}
