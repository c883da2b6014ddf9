use backend_api::client::{PATH_CONVERSATIONS, PATH_LOGIN};
use backend_api::{BackendApiClient, BackendApiConfig};
use chat_backend::LoginRequest;
use reqwest::Method;

#[test]
fn http_request_targets_versioned_endpoint() {
    let config = BackendApiConfig::new("https://api.example.com/");
    let client = BackendApiClient::new(config).expect("client");
    let url = client.endpoint(PATH_LOGIN).expect("endpoint");

    let request = client
        .build_request(
            Method::POST,
            url,
            None,
            Some(&LoginRequest::new("alice", "correctpw")),
        )
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        request.url().as_str(),
        "https://api.example.com/api/v1/auth/token"
    );
    assert_eq!(request.method(), "POST");
    assert!(request.headers().get("authorization").is_none());

    let body = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("buffered body");
    let value: serde_json::Value = serde_json::from_slice(body).expect("json body");
    assert_eq!(value["username"], "alice");
    assert_eq!(value["password"], "correctpw");
}

#[test]
fn http_request_carries_bearer_token() {
    let client = BackendApiClient::new(BackendApiConfig::default()).expect("client");
    let url = client.endpoint(PATH_CONVERSATIONS).expect("endpoint");

    let request = client
        .build_request::<()>(Method::GET, url, Some("tok-1"), None)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer tok-1")
    );
    assert!(request.body().is_none());
}

#[test]
fn client_rejects_invalid_base_url() {
    assert!(BackendApiClient::new(BackendApiConfig::new("localhost:8080")).is_err());
}
