mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::{MockUpstream, text_event};
use harness::server::TestServer;

async fn generate(mock: &MockUpstream, body: serde_json::Value) -> reqwest::Response {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new(&mock.base_url(), dir.path()).build();
    let server = TestServer::start(config).await.unwrap();

    server
        .client()
        .post(server.url("/v1/images/generations"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn url_format_returns_resolved_link() {
    let mock = MockUpstream::start_with_events(vec![
        text_event("Here is your picture: "),
        text_event("![image](https://spc.unk/abc123)"),
    ])
    .await
    .unwrap();

    let resp = generate(&mock, serde_json::json!({"prompt": "a lighthouse at dusk"})).await;
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["created"].as_u64().unwrap() > 0);
    assert_eq!(json["data"][0]["url"], format!("{}/files/abc123.png", mock.base_url()));
    assert!(json["data"][0].get("b64_json").is_none());

    let sent = mock.last_body();
    assert_eq!(sent["source"], "chat/pro_image");
    assert_eq!(sent["function_image_gen"], true);
    assert_eq!(sent["image_aspect_ratio"], "1:1");
    assert_eq!(sent["image_style"], "photographic");
    assert_eq!(sent["messages"][1]["content"], "Draw: a lighthouse at dusk");
    assert!(sent.get("temperature").is_none());
}

#[tokio::test]
async fn b64_json_format_returns_image_bytes() {
    let mock = MockUpstream::start_with_events(vec![text_event("![image](https://spc.unk/abc123)")])
        .await
        .unwrap();

    let resp = generate(&mock, serde_json::json!({"prompt": "a cat", "response_format": "B64_JSON"})).await;
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["data"][0]["b64_json"], "ZmFrZS1wbmc=");
    assert!(json["data"][0].get("url").is_none());
}

#[tokio::test]
async fn missing_prompt_is_rejected() {
    let mock = MockUpstream::start().await.unwrap();

    let resp = generate(&mock, serde_json::json!({"response_format": "url"})).await;
    assert_eq!(resp.status(), 400);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("prompt"));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn reply_without_image_is_server_error() {
    let mock = MockUpstream::start_with_events(vec![text_event("I would rather not.")]).await.unwrap();

    let resp = generate(&mock, serde_json::json!({"prompt": "a cat"})).await;
    assert_eq!(resp.status(), 500);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["error"].is_string());
}
