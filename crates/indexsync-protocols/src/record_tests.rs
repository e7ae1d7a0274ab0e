use super::*;
use serde_json::json;

#[test]
fn test_write_origin_dispatch() {
    assert!(WriteOrigin::User.dispatches_hooks());
    assert!(!WriteOrigin::Synchronizer.dispatches_hooks());
}

#[test]
fn test_get_str_defaults_to_empty() {
    let record = Record::new("r1", "docs")
        .with_field("title", Value::Null)
        .with_field("content", "hello");
    assert_eq!(record.get_str("title"), "");
    assert_eq!(record.get_str("missing"), "");
    assert_eq!(record.get_str("content"), "hello");
}

#[test]
fn test_get_i64_variants() {
    let record = Record::new("r1", "docs")
        .with_field("a", 7)
        .with_field("b", 3.0)
        .with_field("c", 2.5)
        .with_field("d", "42")
        .with_field("e", Value::Null);
    assert_eq!(record.get_i64("a"), Some(7));
    assert_eq!(record.get_i64("b"), Some(3));
    assert_eq!(record.get_i64("c"), None);
    assert_eq!(record.get_i64("d"), Some(42));
    assert_eq!(record.get_i64("e"), None);
    assert_eq!(record.get_i64("missing"), None);
}

#[test]
fn test_record_serializes_flat() {
    let mut record = Record::new("r1", "docs").with_field("content", "hello");
    record.set("vector_id", 3);
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], "r1");
    assert_eq!(value["collectionName"], "docs");
    assert_eq!(value["content"], "hello");
    assert_eq!(value["vector_id"], json!(3));
}

#[test]
fn test_event_collection() {
    let event = RecordEvent::new(RecordEventKind::Deleted, Record::new("r1", "posts"));
    assert_eq!(event.collection(), "posts");
    assert_eq!(event.kind, RecordEventKind::Deleted);
}
