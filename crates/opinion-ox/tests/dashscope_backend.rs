use dashscope_ox::{DashScope, RetryPolicy};
use opinion_ox::{AnalysisOutput, Analyzer, Payload};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn dashscope(base_url: String) -> DashScope {
    DashScope::builder()
        .api_key("test-key")
        .base_url(base_url)
        .retry(RetryPolicy::no_retry())
        .build()
}

#[tokio::test]
async fn test_analyzer_over_dashscope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "qwen-vl-max-latest"})))
        .respond_with(completion("海报写着代下单五元一杯"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "qwen3-235b-a22b"})))
        .respond_with(completion(r#"{"结论": "类别4", "原因": "有偿代下单。"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = Analyzer::new(dashscope(server.uri()), "/no/such/dict_example.json");
    let payload = Payload {
        content: "霸王茶姬买一送一".to_string(),
        images: vec!["https://example.com/poster.jpg".to_string()],
    };

    // The analysis future must be spawnable.
    let output = tokio::spawn(async move { analyzer.analyze(&payload).await })
        .await
        .unwrap();
    assert_eq!(
        output,
        AnalysisOutput::completion(r#"{"结论": "类别4", "原因": "有偿代下单。"}"#)
    );

    let requests = server.received_requests().await.unwrap();
    let text_request: Value = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .find(|body| body["model"] == "qwen3-235b-a22b")
        .unwrap();
    assert_eq!(text_request["max_tokens"], 16384);
    let prompt = text_request["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("霸王茶姬买一送一\n海报写着代下单五元一杯\n"));
}

#[tokio::test]
async fn test_analyzer_over_dashscope_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = Analyzer::new(dashscope(server.uri()), "/no/such/dict_example.json");
    let output = analyzer
        .analyze(&Payload {
            content: "喝完肚子疼".to_string(),
            images: vec![],
        })
        .await;

    assert!(matches!(output, AnalysisOutput::Error { .. }));
}
