use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, MockConfig, User};
use serde_json::Value;
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
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

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

/// Send one request through a router that keeps its state between calls.
async fn call(app: &mut Router, request: Request<String>) -> axum::response::Response {
    ServiceExt::<Request<String>>::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

async fn signed_in(config: MockConfig) -> Router {
    let mut app = app_with(config);
    let resp = call(
        &mut app,
        json_request("POST", "/rest/signin", r#"{"username":"Tim","password":"PASSWORD"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    app
}

async fn assert_error(resp: axum::response::Response, status: StatusCode, message: &str) {
    assert_eq!(resp.status(), status);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], message);
}

// --- sign in ---

#[tokio::test]
async fn sign_in_returns_success() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/signin",
            r#"{"username":"tim","password":"password"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn sign_in_missing_fields_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/rest/signin", r#"{"username":"tim"}"#))
        .await
        .unwrap();

    assert_error(resp, StatusCode::BAD_REQUEST, "Username & Password Required").await;
}

#[tokio::test]
async fn sign_in_wrong_password_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/signin",
            r#"{"username":"tim","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_error(resp, StatusCode::BAD_REQUEST, "Invalid Username or Password").await;
}

#[tokio::test]
async fn malformed_body_gets_error_envelope() {
    let resp = app()
        .oneshot(json_request("POST", "/rest/signin", "{oops"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = body_json(resp).await;
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn missing_content_type_gets_error_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/rest/signin")
        .body(r#"{"username":"tim","password":"password"}"#.to_string())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_error(
        resp,
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "Expected request with `Content-Type: application/json`",
    )
    .await;
}

#[tokio::test]
async fn sign_out_ends_session() {
    let mut app = signed_in(MockConfig::default()).await;

    let resp = call(&mut app, json_request("POST", "/rest/signin/signout", "")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get_request("/rest/user")).await;
    assert_error(resp, StatusCode::UNAUTHORIZED, "Not Logged In").await;
}

// --- signed-out guard ---

#[tokio::test]
async fn protected_routes_require_login() {
    for (method, uri, body) in [
        ("GET", "/rest/user", ""),
        ("PUT", "/rest/user", r#"{"username":"x"}"#),
        ("GET", "/rest/credits", ""),
        ("POST", "/rest/credits", r#"{"multiplier":1}"#),
        ("GET", "/rest/chat", ""),
        ("POST", "/rest/chat", r#"{"prompt":"hi"}"#),
    ] {
        let request = if body.is_empty() {
            Request::builder()
                .method(method)
                .uri(uri)
                .body(String::new())
                .unwrap()
        } else {
            json_request(method, uri, body)
        };
        let resp = app().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

// --- user ---

#[tokio::test]
async fn update_user_changes_username() {
    let mut app = signed_in(MockConfig::default()).await;

    let resp = call(&mut app, json_request("PUT", "/rest/user", r#"{"username":"timv"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get_request("/rest/user")).await;
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "timv");
    assert_eq!(user.first_name, "Tim");
}

#[tokio::test]
async fn update_user_without_username_returns_400() {
    let mut app = signed_in(MockConfig::default()).await;
    let resp = call(&mut app, json_request("PUT", "/rest/user", r#"{"username":""}"#)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "Username Required").await;
}

// --- credits ---

#[tokio::test]
async fn credits_multipliers_add_tiers() {
    let mut app = signed_in(MockConfig::default()).await;

    for multiplier in [1, 2, 3] {
        let body = format!(r#"{{"multiplier":{multiplier}}}"#);
        let resp = call(&mut app, json_request("POST", "/rest/credits", &body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], b"{}");
    }

    let resp = call(&mut app, get_request("/rest/credits")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["credits"], 1000 + 1000 + 5000 + 10000);
}

#[tokio::test]
async fn credits_invalid_multiplier_returns_400() {
    let mut app = signed_in(MockConfig::default()).await;
    let resp = call(&mut app, json_request("POST", "/rest/credits", r#"{"multiplier":7}"#)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "Invalid Multiplier").await;
}

#[tokio::test]
async fn credits_fail_when_configured_to() {
    let mut app = signed_in(MockConfig {
        failure_rate: 1.0,
        ..MockConfig::default()
    })
    .await;
    let resp = call(&mut app, get_request("/rest/credits")).await;
    assert_error(resp, StatusCode::INTERNAL_SERVER_ERROR, "Server Error").await;
}

// --- chat ---

#[tokio::test]
async fn chat_appends_user_then_assistant() {
    let mut app = signed_in(MockConfig::default()).await;

    let resp = call(&mut app, json_request("POST", "/rest/chat", r#"{"prompt":"hi"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get_request("/rest/chat")).await;
    let body: Value = body_json(resp).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "hi");
    assert_eq!(messages[2]["role"], "assistant");
}

#[tokio::test]
async fn chat_without_prompt_returns_400() {
    let mut app = signed_in(MockConfig::default()).await;
    let resp = call(&mut app, json_request("POST", "/rest/chat", r#"{}"#)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "Prompt Required").await;
}
