use super::*;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

const PATH: &str = "/models/text-embedding-004:embedContent";

fn provider(uri: String) -> GeminiEmbedding {
    GeminiEmbedding::new(GeminiClientConfig::new("test-key").with_base_url(uri))
        .unwrap()
        .with_dimension(3)
}

#[test]
fn test_provider_id_and_dimension() {
    let provider = GeminiEmbedding::from_api_key("test-key").unwrap();
    assert_eq!(provider.id(), "gemini");
    assert_eq!(provider.dimension(), 768);
}

#[test]
fn test_build_request_omits_unspecified_and_empty_title() {
    let provider = GeminiEmbedding::from_api_key("test-key").unwrap();
    let request = provider.build_request(TaskType::Unspecified, "", "hello");
    assert_eq!(request.model, "models/text-embedding-004");
    assert!(request.task_type.is_none());
    assert!(request.title.is_none());

    let request = provider.build_request(TaskType::RetrievalDocument, "A", "hello");
    assert_eq!(request.task_type.as_deref(), Some("RETRIEVAL_DOCUMENT"));
    assert_eq!(request.title.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_embed_success() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .and(matchers::query_param("key", "test-key"))
        .and(matchers::body_partial_json(serde_json::json!({
            "model": "models/text-embedding-004",
            "taskType": "RETRIEVAL_QUERY",
            "content": {"parts": [{"text": "hello"}]}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"embedding": {"values": [0.1, 0.2, 0.3]}}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedding = provider(mock_server.uri())
        .embed(TaskType::RetrievalQuery, "", "hello")
        .await
        .unwrap();
    assert_eq!(embedding.vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_embed_api_error() {
    let mock_server = MockServer::start().await;

    let error_body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string(error_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = provider(mock_server.uri())
        .embed(TaskType::RetrievalDocument, "A", "hello")
        .await;
    match result.unwrap_err() {
        ProviderError::AuthenticationFailed(message) => {
            assert!(message.contains("API key not valid"));
        }
        other => panic!("Expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_embed_rate_limited_plain_body() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let err = provider(mock_server.uri())
        .embed(TaskType::RetrievalDocument, "", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited(m) if m == "slow down"));
}

#[tokio::test]
async fn test_embed_dimension_mismatch() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"embedding": {"values": [0.1, 0.2]}}"#),
        )
        .mount(&mock_server)
        .await;

    let err = provider(mock_server.uri())
        .embed(TaskType::RetrievalDocument, "", "hello")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn test_embed_malformed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = provider(mock_server.uri())
        .embed(TaskType::RetrievalDocument, "", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_embed_empty_values() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"embedding": {}}"#))
        .mount(&mock_server)
        .await;

    let err = provider(mock_server.uri())
        .embed(TaskType::RetrievalDocument, "", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_embed_network_error() {
    let err = provider("http://127.0.0.1:1".to_string())
        .embed(TaskType::RetrievalDocument, "", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)));
}
