use super::*;
use serde_json::json;

#[test]
fn test_request_serialization() {
    let request = EmbedContentRequest {
        model: "models/text-embedding-004".to_string(),
        content: Content::text("hello world"),
        task_type: Some("RETRIEVAL_DOCUMENT".to_string()),
        title: Some("A".to_string()),
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({
            "model": "models/text-embedding-004",
            "content": {"parts": [{"text": "hello world"}]},
            "taskType": "RETRIEVAL_DOCUMENT",
            "title": "A"
        })
    );
}

#[test]
fn test_request_omits_optional_fields() {
    let request = EmbedContentRequest {
        model: "models/text-embedding-004".to_string(),
        content: Content::text("q"),
        task_type: None,
        title: None,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert!(value.get("taskType").is_none());
    assert!(value.get("title").is_none());
}

#[test]
fn test_response_deserialization() {
    let response: EmbedContentResponse =
        serde_json::from_str(r#"{"embedding": {"values": [0.5, -1.0, 2]}}"#).unwrap();
    assert_eq!(response.embedding.values, vec![0.5, -1.0, 2.0]);
}

#[test]
fn test_error_deserialization() {
    let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
    let error: GeminiError = serde_json::from_str(body).unwrap();
    assert_eq!(error.error.code, 400);
    assert_eq!(error.error.status, "INVALID_ARGUMENT");
}
