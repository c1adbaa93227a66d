//! Real vendor adapters against a local mock server, wired up through
//! configuration the way the binary does it.

use serde_json::{json, Value};
use switchboard::{CapabilityKind, Orchestrator, SwitchboardConfig};
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, dir: &TempDir) -> SwitchboardConfig {
    let mut config = SwitchboardConfig::default();
    config.credentials.openai_api_key = Some("sk-test".into());
    config.credentials.gemini_api_key = Some("gem-key".into());
    config.endpoints.openai_base_url = Some(server.uri());
    config.endpoints.gemini_base_url = Some(server.uri());
    config.defaults.text_provider = "openai".into();
    config.output.image_dir = dir.path().join("images");
    config.output.video_dir = dir.path().join("videos");
    config
}

#[tokio::test]
async fn test_conversation_carries_across_vendors() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Paris"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Rome"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut orchestrator = Orchestrator::new(&config_for(&server, &dir)).unwrap();
    assert_eq!(
        orchestrator.list_identities(CapabilityKind::Text),
        vec!["openai", "gemini", "duckduckgo"]
    );
    assert_eq!(orchestrator.list_identities(CapabilityKind::Image), vec!["dalle"]);

    assert_eq!(orchestrator.chat("Capital of France?", None).await, "Paris");
    assert!(orchestrator.set_active_selection(CapabilityKind::Text, "gemini"));
    assert_eq!(orchestrator.chat("And of Italy?", None).await, "Rome");

    let requests = server.received_requests().await.unwrap();
    let gemini = requests
        .iter()
        .find(|r| r.url.path().ends_with(":generateContent"))
        .unwrap();
    let body: Value = serde_json::from_slice(&gemini.body).unwrap();
    assert_eq!(
        body["contents"],
        json!([
            {"role": "user", "parts": [{"text": "Capital of France?"}]},
            {"role": "model", "parts": [{"text": "Paris"}]},
            {"role": "user", "parts": [{"text": "And of Italy?"}]}
        ])
    );

    let openai = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .unwrap();
    let body: Value = serde_json::from_slice(&openai.body).unwrap();
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(
        body["messages"],
        json!([{"role": "user", "content": "Capital of France?"}])
    );
}

#[tokio::test]
async fn test_vendor_errors_stay_conversational() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let mut orchestrator = Orchestrator::new(&config_for(&server, &dir)).unwrap();
    let reply = orchestrator.chat("hello", None).await;

    assert!(reply.starts_with("Error: openai: authentication failed"));
    assert!(reply.contains("Incorrect API key provided"));
    assert_eq!(orchestrator.history().len(), 2);
}
