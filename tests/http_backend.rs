//! HTTP-level tests for `HttpBackend` and `QueryClient` against wiremock.

use serde_json::json;
use std::time::Duration;

use emotion_bench::{
    backend::{ApiFlavor, Backend, HttpBackend},
    error::{BackendError, QueryError},
    prompt::Prompt,
    FailureClass, QueryClient, RetryPolicy,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_backend(server: &MockServer, model: &str) -> HttpBackend {
    HttpBackend::new(
        ApiFlavor::OpenAiChat,
        Some(format!("{}/v1", server.uri())),
        Some("sk-test".into()),
        model.into(),
        Duration::from_secs(5),
    )
    .expect("failed to build backend")
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }]
    })
}

fn client<B: Backend>(backend: B, attempts: u32) -> QueryClient<B> {
    QueryClient::new(backend, RetryPolicy::new(attempts, Duration::ZERO))
}

#[tokio::test]
async fn chat_success_sends_default_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-nano",
            "temperature": 0.0,
            "max_tokens": 150,
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"emotion": "joy", "cause": "achievement"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(chat_backend(&server, "gpt-4.1-nano"), 3);
    let answer = c.query("q1", &Prompt::plain("scenario prompt")).await.unwrap();
    assert_eq!(answer.emotion, "joy");
    assert_eq!(answer.cause, "achievement");
}

#[tokio::test]
async fn reasoning_model_sends_completion_token_bound() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-5-nano", "max_completion_tokens": 2000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"emotion":"fear","cause":"loss"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let backend = chat_backend(&server, "gpt-5-nano");
    let body = backend.build_request("x", backend.profile());
    assert!(body.get("temperature").is_none());

    let answer = client(backend, 1).query("q1", &Prompt::plain("x")).await.unwrap();
    assert_eq!(answer.emotion, "fear");
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"emotion":"anger","cause":"loss"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(chat_backend(&server, "gpt-4.1-nano"), 3)
        .query("q1", &Prompt::plain("x"))
        .await
        .unwrap();
    assert_eq!(answer.emotion, "anger");
}

#[tokio::test]
async fn status_errors_carry_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let backend = chat_backend(&server, "gpt-4.1-nano");
    let err = backend.complete("x", backend.profile()).await.unwrap_err();
    match &err {
        BackendError::Status { status, body } => {
            assert_eq!(*status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(err.class(), FailureClass::Status(429));
}

#[tokio::test]
async fn empty_body_on_every_attempt_exhausts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(chat_backend(&server, "gpt-4.1-nano"), 2)
        .query("q1", &Prompt::plain("x"))
        .await
        .unwrap_err();
    let QueryError::Exhausted { attempts, last, .. } = err;
    assert_eq!(attempts, 2);
    assert_eq!(last, FailureClass::EmptyBody);
}

#[tokio::test]
async fn null_content_counts_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;

    let err = client(chat_backend(&server, "gpt-4.1-nano"), 1)
        .query("q1", &Prompt::plain("x"))
        .await
        .unwrap_err();
    let QueryError::Exhausted { last, .. } = err;
    assert_eq!(last, FailureClass::EmptyBody);
}

#[tokio::test]
async fn non_json_body_is_unparseable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let backend = chat_backend(&server, "gpt-4.1-nano");
    let err = backend.complete("x", backend.profile()).await.unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)));
    assert_eq!(err.class(), FailureClass::Unparseable);
}

#[tokio::test]
async fn completions_flavor_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/completions"))
        .and(body_partial_json(json!({
            "prompt": "scenario prompt",
            "model": "agir-learner",
            "max_tokens": 500,
            "temperature": 0.0,
            "user_id": "u-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "Answer: {\"emotion\": \"joy\", \"cause\": \"achievement\"} hope that helps" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(
        ApiFlavor::Completions { user_id: Some("u-1".into()) },
        Some(format!("{}/api", server.uri())),
        None,
        "agir-learner".into(),
        Duration::from_secs(5),
    )
    .unwrap();
    let answer = client(backend, 1).query("q1", &Prompt::plain("scenario prompt")).await.unwrap();
    assert_eq!(answer.emotion, "joy");
    assert_eq!(answer.cause, "achievement");
}

#[tokio::test]
async fn probe_uses_short_warm_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "max_tokens": 100,
            "temperature": 0.7,
            "messages": [{ "role": "user", "content": "What book have you read recently?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Dune.")))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client(chat_backend(&server, "gpt-4.1-nano"), 3).probe().await.unwrap();
    assert_eq!(completion.status, 200);
    assert_eq!(completion.text, "Dune.");
}

#[tokio::test]
async fn probe_reports_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = client(chat_backend(&server, "gpt-4.1-nano"), 3).probe().await.unwrap_err();
    assert_eq!(err.class(), FailureClass::Status(401));
}

#[tokio::test]
async fn refused_connection_is_transient_not_status() {
    // nothing listens on the discard port
    let backend = HttpBackend::new(
        ApiFlavor::OpenAiChat,
        Some("http://127.0.0.1:9/v1".into()),
        Some("sk-test".into()),
        "gpt-4.1-nano".into(),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = backend.complete("x", backend.profile()).await.unwrap_err();
    assert!(matches!(
        err.class(),
        FailureClass::Connect | FailureClass::Transport | FailureClass::Timeout
    ));
}
