mod common;

use serde::Deserialize;
use serde_json::json;
use trendscope_common::{LlmConfig, Result};
use trendscope_llm::decode::lenient_decode;
use trendscope_llm::ensure_llm_ready;
use trendscope_llm::traits::LlmClient;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Queries(Vec<String>);

#[tokio::test]
async fn openai_client_honours_base_url_and_decodes_fenced_output() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-mock"))
        .and(body_partial_json(json!({"model": "gpt-mock"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-mock",
            "output": [{
                "type": "message",
                "content": [{
                    "type": "output_text",
                    "text": "```json\n[\"agent frameworks\", \"open weights\"]\n```"
                }]
            }],
            "usage": {"total_tokens": 42}
        })))
        .mount(&server)
        .await;

    let cfg = LlmConfig::OpenAi {
        api_key: "sk-mock".into(),
        model: "gpt-mock".into(),
        base_url: Some(format!("{}/v1", server.uri())),
    };
    let client = ensure_llm_ready(&cfg).await?;
    let resp = client.analyze("list queries", 64, 0.2).await?;
    assert_eq!(resp.tokens_used, Some(42));

    let Queries(queries) = lenient_decode(&resp.text).expect("fenced array decodes");
    assert_eq!(queries, vec!["agent frameworks", "open weights"]);
    Ok(())
}

#[tokio::test]
async fn provider_errors_surface_as_trend_errors() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .mount(&server)
        .await;

    let cfg = LlmConfig::OpenAi {
        api_key: "sk-wrong".into(),
        model: "gpt-mock".into(),
        base_url: Some(server.uri()),
    };
    let client = ensure_llm_ready(&cfg).await.unwrap();
    let err = client.generate("hi", None, None, None).await.unwrap_err();
    assert!(err.to_string().contains("bad key"));
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn missing_provider_is_a_config_error() {
    let err = ensure_llm_ready(&LlmConfig::None).await.err().unwrap();
    assert!(matches!(err, trendscope_common::TrendError::Config(_)));
}
